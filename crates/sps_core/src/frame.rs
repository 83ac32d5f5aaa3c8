//! Sprite-sheet frame records and named frame sequences.
//!
//! A `Frame` is a source rectangle on the sprite sheet plus an anchor offset
//! relative to the rectangle's top-left. The JSON shape `{x,y,w,h,ax,ay}` is
//! shared by the Studio export and the sprite library file, so a sequence
//! exported from the editor can be pasted straight into the library.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Frame {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
    pub ax: i32,
    pub ay: i32,
}

impl Frame {
    pub const fn new(x: i32, y: i32, w: i32, h: i32, ax: i32, ay: i32) -> Self {
        Self { x, y, w, h, ax, ay }
    }

    pub fn right(&self) -> i32 {
        self.x + self.w
    }

    pub fn bottom(&self) -> i32 {
        self.y + self.h
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.w <= 0 || self.h <= 0 {
            return Err(format!(
                "frame at ({}, {}) has non-positive size {}x{}",
                self.x, self.y, self.w, self.h
            ));
        }
        Ok(())
    }
}

/// An ordered, append-only list of frames. Insertion order is playback order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FrameSequence {
    frames: Vec<Frame>,
}

impl FrameSequence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_frames(frames: Vec<Frame>) -> Self {
        Self { frames }
    }

    pub fn push(&mut self, frame: Frame) {
        self.frames.push(frame);
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Frame> {
        self.frames.get(index)
    }

    pub fn last(&self) -> Option<&Frame> {
        self.frames.last()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Frame> {
        self.frames.iter()
    }

    /// Pretty-printed JSON array of `{x,y,w,h,ax,ay}` objects in order.
    pub fn to_json(&self) -> Result<String, String> {
        serde_json::to_string_pretty(&self.frames)
            .map_err(|e| format!("Failed to serialize frame sequence: {e}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_keeps_field_and_frame_order() {
        let mut seq = FrameSequence::new();
        seq.push(Frame::new(0, 0, 32, 32, 16, 32));
        seq.push(Frame::new(32, 0, 32, 30, 15, 30));
        let json = seq.to_json().expect("serialize");

        let first = json.find("\"x\": 0").expect("first frame");
        let second = json.find("\"x\": 32").expect("second frame");
        assert!(first < second);

        let keys: Vec<usize> = ["\"x\"", "\"y\"", "\"w\"", "\"h\"", "\"ax\"", "\"ay\""]
            .iter()
            .map(|k| json.find(k).expect("key present"))
            .collect();
        assert!(keys.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn json_parses_back_as_plain_array() {
        let seq = FrameSequence::from_frames(vec![Frame::new(-4, 7, 10, 12, 5, 12)]);
        let json = seq.to_json().expect("serialize");
        let parsed: Vec<Frame> = serde_json::from_str(&json).expect("parse");
        assert_eq!(parsed, vec![Frame::new(-4, 7, 10, 12, 5, 12)]);
    }

    #[test]
    fn empty_sequence_serializes_to_empty_array() {
        let json = FrameSequence::new().to_json().expect("serialize");
        assert_eq!(json.trim(), "[]");
    }

    #[test]
    fn validate_rejects_zero_size() {
        assert!(Frame::new(0, 0, 0, 10, 0, 0).validate().is_err());
        assert!(Frame::new(0, 0, 10, -1, 0, 0).validate().is_err());
        assert!(Frame::new(-50, -50, 1, 1, 0, 0).validate().is_ok());
    }
}
