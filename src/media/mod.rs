pub mod youtube;

pub use youtube::{
    extract_video_id, is_valid_youtube_url, thumbnail_url, to_embed_url, ThumbnailQuality,
};
