pub mod facebook;
pub mod tiktok;
pub mod youtube;
