use corpus_core::Stage;
use std::ffi::OsString;

/// Replaces every digit with `0` through the system `sed`.
#[derive(Debug, Default, Clone, Copy)]
pub struct NormalizeDigitsStage;

impl NormalizeDigitsStage {
    pub const EXPRESSION: &'static str = "s/[[:digit:]]/0/g";
}

impl Stage for NormalizeDigitsStage {
    fn id(&self) -> &str {
        "normalize-digits"
    }

    fn program(&self) -> OsString {
        OsString::from("sed")
    }

    fn args(&self) -> Vec<OsString> {
        vec![OsString::from(Self::EXPRESSION)]
    }
}
