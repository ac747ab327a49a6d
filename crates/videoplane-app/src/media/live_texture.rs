use std::rc::Rc;
use std::sync::Arc;

use super::source::SharedMedia;
use super::types::DecodedFrame;

/// Result of sampling the media source on a render tick.
pub enum SampledFrame {
    /// No decodable frame yet: draw the transparent placeholder.
    NotReady,
    /// Same frame as last tick (or no new one): keep the uploaded texture.
    Unchanged,
    /// A new frame to upload.
    Upload(Arc<DecodedFrame>),
}

/// Pulls the current frame of one media source into the surface texture every
/// tick. Bound for its whole lifetime; a new source gets a new `LiveTexture`.
pub struct LiveTexture {
    source: SharedMedia,
    last_index: Option<usize>,
}

impl LiveTexture {
    pub fn new(source: SharedMedia) -> Self {
        Self {
            source,
            last_index: None,
        }
    }

    /// Sample the source. Never blocks; if the source has nothing new the last
    /// uploaded frame stays in use.
    pub fn sample(&mut self) -> SampledFrame {
        let media = self.source.borrow();
        match media.current_frame() {
            Some((idx, frame)) => {
                if self.last_index == Some(idx) {
                    SampledFrame::Unchanged
                } else {
                    self.last_index = Some(idx);
                    SampledFrame::Upload(frame)
                }
            }
            None if self.last_index.is_some() => SampledFrame::Unchanged,
            None => SampledFrame::NotReady,
        }
    }

    /// True once at least one frame has been handed out for upload.
    pub fn has_frame(&self) -> bool {
        self.last_index.is_some()
    }

    pub fn is_bound_to(&self, source: &SharedMedia) -> bool {
        Rc::ptr_eq(&self.source, source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::source::MediaSource;
    use crate::media::source::tests::{ready_source, test_clip};
    use crate::media::types::MediaLocator;

    #[test]
    fn not_ready_until_clip_loads() {
        let (tx, rx) = crossbeam_channel::bounded(1);
        let media = MediaSource::with_loader(MediaLocator::new("a.mp4"), rx).into_shared();
        let mut tex = LiveTexture::new(media.clone());

        assert!(matches!(tex.sample(), SampledFrame::NotReady));
        assert!(!tex.has_frame());

        tx.send(Ok(test_clip(4, 10.0))).unwrap();
        media.borrow_mut().poll_loader();

        assert!(matches!(tex.sample(), SampledFrame::Upload(_)));
        assert!(tex.has_frame());
    }

    #[test]
    fn unchanged_while_frame_index_stable() {
        let media = ready_source(10, 10.0).into_shared();
        let mut tex = LiveTexture::new(media.clone());
        assert!(matches!(tex.sample(), SampledFrame::Upload(_)));
        assert!(matches!(tex.sample(), SampledFrame::Unchanged));

        media.borrow_mut().seek_absolute(0.55);
        match tex.sample() {
            SampledFrame::Upload(frame) => assert_eq!(frame.data[0], 5),
            _ => panic!("expected upload after seek"),
        }
        assert!(matches!(tex.sample(), SampledFrame::Unchanged));
    }

    #[test]
    fn failed_source_stays_not_ready() {
        let (tx, rx) = crossbeam_channel::bounded(1);
        let media = MediaSource::with_loader(MediaLocator::new("bad.mp4"), rx).into_shared();
        let mut tex = LiveTexture::new(media.clone());
        tx.send(Err("no video stream".into())).unwrap();
        media.borrow_mut().poll_loader();
        assert!(matches!(tex.sample(), SampledFrame::NotReady));
    }

    #[test]
    fn bound_to_its_source_only() {
        let a = ready_source(1, 1.0).into_shared();
        let b = ready_source(1, 1.0).into_shared();
        let tex = LiveTexture::new(a.clone());
        assert!(tex.is_bound_to(&a));
        assert!(!tex.is_bound_to(&b));
    }
}
