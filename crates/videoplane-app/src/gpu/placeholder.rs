use wgpu::{Device, Queue, Texture, TextureFormat, TextureView};

/// Format of video frame textures (and the placeholder standing in for them).
pub const FRAME_FORMAT: TextureFormat = TextureFormat::Rgba8UnormSrgb;

/// A 1x1 transparent texture bound to the surface until the first video frame
/// is decodable.
pub struct PlaceholderTexture {
    #[allow(dead_code)]
    texture: Texture,
    pub view: TextureView,
}

impl PlaceholderTexture {
    pub fn new(device: &Device, queue: &Queue) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("placeholder-1x1"),
            size: wgpu::Extent3d {
                width: 1,
                height: 1,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: FRAME_FORMAT,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        // RGBA8 all zeros = fully transparent
        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &[0u8; 4],
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4),
                rows_per_image: None,
            },
            wgpu::Extent3d {
                width: 1,
                height: 1,
                depth_or_array_layers: 1,
            },
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        Self { texture, view }
    }
}
