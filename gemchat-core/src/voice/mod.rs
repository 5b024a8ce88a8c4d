//! Speech synthesis for reading model replies aloud

pub mod tts;
