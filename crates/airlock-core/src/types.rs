use serde::{Deserialize, Serialize};

/// Positional metadata carried on every frame of one transmission.
///
/// `total`, `filename`, and `size` are identical across a transmission.
/// `size` is the original file length and is informational only: the
/// authenticated plaintext length is what counts after decryption.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameMetadata {
    /// 0-based position of this slice
    pub index: u64,
    /// Number of frames in the transmission
    pub total: u64,
    pub filename: String,
    pub size: u64,
}

/// One slice of an envelope's transport text plus its metadata.
///
/// Wire shape: `{"metadata": {"index", "total", "filename", "size"}, "data": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Frame {
    pub metadata: FrameMetadata,
    /// Slice of the transport text
    pub data: String,
}

impl Frame {
    pub fn index(&self) -> u64 {
        self.metadata.index
    }

    pub fn total(&self) -> u64 {
        self.metadata.total
    }

    pub fn filename(&self) -> &str {
        &self.metadata.filename
    }

    /// Payload length in characters.
    pub fn payload_len(&self) -> usize {
        self.data.chars().count()
    }

    /// Structural check: `1 <= total <= MAX_FRAMES` and `index < total`.
    pub fn is_well_formed(&self) -> bool {
        (1..=crate::MAX_FRAMES).contains(&self.metadata.total)
            && self.metadata.index < self.metadata.total
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(index: u64, total: u64) -> Frame {
        Frame {
            metadata: FrameMetadata {
                index,
                total,
                filename: "a.txt".into(),
                size: 10,
            },
            data: "QUJD".into(),
        }
    }

    #[test]
    fn well_formed_bounds() {
        assert!(frame(0, 1).is_well_formed());
        assert!(frame(2, 3).is_well_formed());
        assert!(!frame(3, 3).is_well_formed());
        assert!(!frame(0, 0).is_well_formed());
        assert!(frame(0, crate::MAX_FRAMES).is_well_formed());
        assert!(!frame(0, crate::MAX_FRAMES + 1).is_well_formed());
        assert!(!frame(u64::MAX - 1, u64::MAX).is_well_formed());
    }

    #[test]
    fn accessors() {
        let f = frame(1, 4);
        assert_eq!(f.index(), 1);
        assert_eq!(f.total(), 4);
        assert_eq!(f.filename(), "a.txt");
        assert_eq!(f.payload_len(), 4);
    }
}
