// Codec capability adapter - Static table of available encoders

use crate::domain::model::VideoCodec;
use crate::ports::CodecCapabilityPort;
use std::collections::HashSet;

/// Encoder availability from a fixed table
#[derive(Debug, Clone)]
pub struct StaticCodecCapabilities {
    supported: HashSet<VideoCodec>,
}

impl StaticCodecCapabilities {
    /// Every codec the crate can target
    pub fn all() -> Self {
        Self::only([VideoCodec::H264, VideoCodec::Hevc])
    }

    /// Only the given codecs
    pub fn only(codecs: impl IntoIterator<Item = VideoCodec>) -> Self {
        Self {
            supported: codecs.into_iter().collect(),
        }
    }

    /// Remove a codec, e.g. on platforms without an HEVC encoder
    pub fn without(mut self, codec: VideoCodec) -> Self {
        self.supported.remove(&codec);
        self
    }
}

impl Default for StaticCodecCapabilities {
    fn default() -> Self {
        Self::all()
    }
}

impl CodecCapabilityPort for StaticCodecCapabilities {
    fn is_supported(&self, codec: VideoCodec) -> bool {
        self.supported.contains(&codec)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_supports_everything() {
        let caps = StaticCodecCapabilities::default();
        assert!(caps.is_supported(VideoCodec::H264));
        assert!(caps.is_supported(VideoCodec::Hevc));
    }

    #[test]
    fn test_without_hevc() {
        let caps = StaticCodecCapabilities::all().without(VideoCodec::Hevc);
        assert!(caps.is_supported(VideoCodec::H264));
        assert!(!caps.is_supported(VideoCodec::Hevc));
    }
}
