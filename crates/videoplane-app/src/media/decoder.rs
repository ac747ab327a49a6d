//! Video pre-decode via ffmpeg subprocess.
//!
//! - `ffprobe` probes metadata (dimensions, fps, duration)
//! - `ffmpeg -f rawvideo -pix_fmt rgba` decodes all frames to memory in one pass
//! - `ffmpeg -vn -f f32le` decodes the audio track, if any, in a second pass
//! - Runs on a loader thread; the result arrives over a channel so the render
//!   tick never waits on it

use std::io::Read;
use std::process::{Command, Stdio};
use std::sync::{Arc, OnceLock};

use crossbeam_channel::Receiver;

use super::types::{DecodedAudio, DecodedClip, DecodedFrame, MediaLocator};

/// Maximum duration (seconds) we pre-decode. Longer clips are truncated.
pub const MAX_PREDECODE_SECS: f64 = 60.0;
/// Frames wider than this are scaled down before decode (keeps RAM bounded).
pub const MAX_DECODE_WIDTH: u32 = 960;

/// Audio is decoded to this rate and channel count; the output stream
/// converts to whatever the device wants.
pub const AUDIO_SAMPLE_RATE: u32 = 48_000;
pub const AUDIO_CHANNELS: u16 = 2;

/// Extensions offered by the open dialog. ffmpeg decides what actually plays.
pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov", "mkv", "webm", "avi", "m4v", "ogv"];

pub type LoadResult = Result<DecodedClip, String>;

/// Check if ffmpeg/ffprobe are available on the system. Cached per process.
pub fn ffmpeg_available() -> bool {
    static AVAILABLE: OnceLock<bool> = OnceLock::new();
    *AVAILABLE.get_or_init(|| {
        Command::new("ffprobe")
            .arg("-version")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|s| s.success())
            .unwrap_or(false)
    })
}

/// Video metadata from ffprobe.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoMeta {
    pub width: u32,
    pub height: u32,
    pub fps: f64,
    pub duration_secs: f64,
    pub has_audio: bool,
}

impl VideoMeta {
    /// Output size for decode: source size scaled down to `MAX_DECODE_WIDTH`,
    /// rounded to even dimensions for ffmpeg's scaler.
    pub fn decode_size(&self) -> (u32, u32) {
        if self.width <= MAX_DECODE_WIDTH || self.width == 0 {
            return (self.width, self.height);
        }
        let scale = MAX_DECODE_WIDTH as f64 / self.width as f64;
        let h = ((self.height as f64 * scale).round() as u32).max(2) & !1;
        (MAX_DECODE_WIDTH, h)
    }
}

/// Probe video metadata using ffprobe.
pub fn probe_video(locator: &MediaLocator) -> Result<VideoMeta, String> {
    let output = Command::new("ffprobe")
        .args([
            "-v", "quiet",
            "-print_format", "json",
            "-show_streams",
            "-show_format",
        ])
        .arg(locator.as_str())
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .output()
        .map_err(|e| format!("ffprobe failed to execute: {e}"))?;

    if !output.status.success() {
        return Err("ffprobe returned non-zero exit code".to_string());
    }

    parse_probe_json(&output.stdout)
}

fn parse_probe_json(bytes: &[u8]) -> Result<VideoMeta, String> {
    let json: serde_json::Value =
        serde_json::from_slice(bytes).map_err(|e| format!("Failed to parse ffprobe JSON: {e}"))?;

    let streams = json["streams"]
        .as_array()
        .ok_or("No streams in ffprobe output")?;

    let video_stream = streams
        .iter()
        .find(|s| s["codec_type"].as_str() == Some("video"))
        .ok_or("No video stream found")?;

    let width = video_stream["width"].as_u64().ok_or("Missing width")? as u32;
    let height = video_stream["height"].as_u64().ok_or("Missing height")? as u32;

    let fps = parse_frame_rate(video_stream["r_frame_rate"].as_str().unwrap_or("30/1"));

    let duration_secs = json["format"]["duration"]
        .as_str()
        .and_then(|s| s.parse::<f64>().ok())
        .or_else(|| {
            video_stream["duration"]
                .as_str()
                .and_then(|s| s.parse::<f64>().ok())
        })
        .unwrap_or(0.0);

    let has_audio = streams
        .iter()
        .any(|s| s["codec_type"].as_str() == Some("audio"));

    Ok(VideoMeta {
        width,
        height,
        fps,
        duration_secs,
        has_audio,
    })
}

fn parse_frame_rate(rate: &str) -> f64 {
    if let Some((num, den)) = rate.split_once('/') {
        let n: f64 = num.parse().unwrap_or(30.0);
        let d: f64 = den.parse().unwrap_or(1.0);
        if d > 0.0 && n > 0.0 { n / d } else { 30.0 }
    } else {
        rate.parse().ok().filter(|r: &f64| *r > 0.0).unwrap_or(30.0)
    }
}

/// Pre-decode all video frames via a single ffmpeg run.
pub fn decode_all_frames(locator: &MediaLocator, meta: &VideoMeta) -> LoadResult {
    let (width, height) = meta.decode_size();
    if width == 0 || height == 0 {
        return Err(format!("video has zero dimensions ({width}x{height})"));
    }
    let frame_size = (width as usize) * (height as usize) * 4;
    let limit_secs = meta.duration_secs.min(MAX_PREDECODE_SECS);
    if meta.duration_secs > MAX_PREDECODE_SECS {
        log::warn!(
            "{} is {:.1}s long, decoding only the first {MAX_PREDECODE_SECS}s",
            locator.display_name(),
            meta.duration_secs
        );
    }

    let est_frames = (limit_secs * meta.fps).ceil() as usize;
    log::info!(
        "Pre-decoding video: ~{} frames at {}x{}, ~{}MB RAM",
        est_frames,
        width,
        height,
        (est_frames * frame_size) / (1024 * 1024),
    );

    let mut child = Command::new("ffmpeg")
        .args(["-i", locator.as_str()])
        .args(["-t", &format!("{MAX_PREDECODE_SECS}")])
        .args([
            "-f", "rawvideo",
            "-pix_fmt", "rgba",
            "-s", &format!("{width}x{height}"),
            "-v", "quiet",
            "pipe:1",
        ])
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|e| format!("Failed to spawn ffmpeg: {e}"))?;

    let mut stdout = child.stdout.take().ok_or("ffmpeg: no stdout pipe")?;

    let mut frames = Vec::with_capacity(est_frames);
    let mut buf = vec![0u8; frame_size];
    // read_exact fails at EOF (or on a short final frame)
    while stdout.read_exact(&mut buf).is_ok() {
        frames.push(Arc::new(DecodedFrame {
            data: buf.clone(),
            width,
            height,
        }));
    }

    let _ = child.wait();

    if frames.is_empty() {
        return Err("ffmpeg decoded zero frames".to_string());
    }

    // Trust the decoded frame count over container metadata
    let decoded_secs = frames.len() as f64 / meta.fps;
    let duration_secs = if meta.duration_secs > 0.0 {
        meta.duration_secs.min(decoded_secs)
    } else {
        decoded_secs
    };

    log::info!(
        "Decoded {} video frames ({}MB), {:.2}s",
        frames.len(),
        (frames.len() * frame_size) / (1024 * 1024),
        duration_secs,
    );

    Ok(DecodedClip {
        width,
        height,
        fps: meta.fps,
        duration_secs,
        frames,
        audio: None,
    })
}

/// Decode the audio track to interleaved f32 at `AUDIO_SAMPLE_RATE`.
pub fn decode_audio(locator: &MediaLocator) -> Result<DecodedAudio, String> {
    let output = Command::new("ffmpeg")
        .args(["-i", locator.as_str()])
        .args(["-t", &format!("{MAX_PREDECODE_SECS}")])
        .args([
            "-vn",
            "-f", "f32le",
            "-ac", &AUDIO_CHANNELS.to_string(),
            "-ar", &AUDIO_SAMPLE_RATE.to_string(),
            "-v", "quiet",
            "pipe:1",
        ])
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .output()
        .map_err(|e| format!("Failed to spawn ffmpeg for audio: {e}"))?;

    let samples = samples_from_f32le(&output.stdout);
    if samples.is_empty() {
        return Err("ffmpeg decoded no audio".to_string());
    }
    let audio = DecodedAudio {
        samples,
        sample_rate: AUDIO_SAMPLE_RATE,
        channels: AUDIO_CHANNELS,
    };
    log::info!(
        "Decoded {:.2}s of audio ({}MB)",
        audio.duration_secs(),
        (audio.samples.len() * 4) / (1024 * 1024),
    );
    Ok(audio)
}

/// Little-endian f32 samples. A trailing partial sample is dropped.
fn samples_from_f32le(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect()
}

/// Probe, decode video, then decode audio. A missing or broken audio track
/// only costs the sound.
fn load_clip(locator: &MediaLocator) -> LoadResult {
    let meta = probe_video(locator)?;
    let mut clip = decode_all_frames(locator, &meta)?;
    if meta.has_audio {
        match decode_audio(locator) {
            Ok(audio) => clip.audio = Some(Arc::new(audio)),
            Err(e) => log::warn!("{}: {e}; playing without sound", locator.display_name()),
        }
    }
    Ok(clip)
}

/// Probe and decode `locator` on a background thread. The receiver yields
/// exactly one result.
pub fn spawn_loader(locator: MediaLocator) -> Receiver<LoadResult> {
    let (tx, rx) = crossbeam_channel::bounded(1);
    let spawned = std::thread::Builder::new()
        .name("media-loader".into())
        .spawn(move || {
            let result = if ffmpeg_available() {
                load_clip(&locator)
            } else {
                Err("ffmpeg/ffprobe not found on PATH".to_string())
            };
            let _ = tx.send(result);
        });
    if let Err(e) = spawned {
        log::error!("Failed to spawn media loader thread: {e}");
    }
    rx
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_rate_fraction() {
        assert!((parse_frame_rate("30000/1001") - 29.97).abs() < 0.01);
        assert_eq!(parse_frame_rate("25/1"), 25.0);
    }

    #[test]
    fn frame_rate_fallbacks() {
        assert_eq!(parse_frame_rate("0/0"), 30.0);
        assert_eq!(parse_frame_rate("garbage"), 30.0);
        assert_eq!(parse_frame_rate("24"), 24.0);
    }

    #[test]
    fn probe_json_parses_video_stream() {
        let json = br#"{
            "streams": [
                {"codec_type": "audio"},
                {"codec_type": "video", "width": 1280, "height": 720, "r_frame_rate": "30/1"}
            ],
            "format": {"duration": "10.000000"}
        }"#;
        let meta = parse_probe_json(json).unwrap();
        assert_eq!(
            meta,
            VideoMeta {
                width: 1280,
                height: 720,
                fps: 30.0,
                duration_secs: 10.0,
                has_audio: true,
            }
        );
    }

    #[test]
    fn probe_json_without_video_is_error() {
        let json = br#"{"streams": [{"codec_type": "audio"}], "format": {}}"#;
        assert!(parse_probe_json(json).is_err());
    }

    #[test]
    fn probe_json_missing_duration_is_unknown() {
        let json = br#"{"streams": [{"codec_type": "video", "width": 2, "height": 2}]}"#;
        let meta = parse_probe_json(json).unwrap();
        assert_eq!(meta.duration_secs, 0.0);
        assert_eq!(meta.fps, 30.0);
        assert!(!meta.has_audio);
    }

    #[test]
    fn f32le_bytes_to_samples() {
        let mut bytes = Vec::new();
        for v in [0.5f32, -1.0, 0.25] {
            bytes.extend_from_slice(&v.to_le_bytes());
        }
        bytes.push(0xff);
        assert_eq!(samples_from_f32le(&bytes), vec![0.5, -1.0, 0.25]);
        assert!(samples_from_f32le(&[1, 2]).is_empty());
    }

    #[test]
    fn decode_size_scales_wide_video() {
        let meta = VideoMeta {
            width: 1920,
            height: 1080,
            fps: 30.0,
            duration_secs: 1.0,
            has_audio: false,
        };
        assert_eq!(meta.decode_size(), (960, 540));

        let small = VideoMeta {
            width: 640,
            ..meta
        };
        assert_eq!(small.decode_size(), (640, 1080));
    }
}
