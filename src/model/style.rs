//! The closed set of supported styles and their artifact table.

use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// A pretrained fast-neural-style model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StyleId {
    Mosaic,
    Candy,
    RainPrincess,
    Udnie,
    Pointilism,
}

impl StyleId {
    /// Every style, in picker order.
    pub const ALL: [Self; 5] = [
        Self::Mosaic,
        Self::Candy,
        Self::RainPrincess,
        Self::Udnie,
        Self::Pointilism,
    ];

    /// Canonical name, used on the command line and in artifact file names.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Mosaic => "mosaic",
            Self::Candy => "candy",
            Self::RainPrincess => "rain-princess",
            Self::Udnie => "udnie",
            Self::Pointilism => "pointilism",
        }
    }

    /// Human-readable label.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Mosaic => "Mosaic",
            Self::Candy => "Candy",
            Self::RainPrincess => "Rain Princess",
            Self::Udnie => "Udnie",
            Self::Pointilism => "Pointilism",
        }
    }

    /// File name of the opset 9 ONNX export for this style.
    #[must_use]
    pub const fn artifact_file_name(&self) -> &'static str {
        match self {
            Self::Mosaic => "mosaic-9.onnx",
            Self::Candy => "candy-9.onnx",
            Self::RainPrincess => "rain-princess-9.onnx",
            Self::Udnie => "udnie-9.onnx",
            Self::Pointilism => "pointilism-9.onnx",
        }
    }

    /// Download URL in the ONNX model zoo.
    #[must_use]
    pub const fn download_url(&self) -> &'static str {
        match self {
            Self::Mosaic => {
                "https://github.com/onnx/models/raw/main/validated/vision/style_transfer/fast_neural_style/model/mosaic-9.onnx"
            }
            Self::Candy => {
                "https://github.com/onnx/models/raw/main/validated/vision/style_transfer/fast_neural_style/model/candy-9.onnx"
            }
            Self::RainPrincess => {
                "https://github.com/onnx/models/raw/main/validated/vision/style_transfer/fast_neural_style/model/rain-princess-9.onnx"
            }
            Self::Udnie => {
                "https://github.com/onnx/models/raw/main/validated/vision/style_transfer/fast_neural_style/model/udnie-9.onnx"
            }
            Self::Pointilism => {
                "https://github.com/onnx/models/raw/main/validated/vision/style_transfer/fast_neural_style/model/pointilism-9.onnx"
            }
        }
    }
}

impl fmt::Display for StyleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for StyleId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|style| style.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| Error::InvalidParameter {
                name: "style".to_string(),
                reason: format!(
                    "unknown style {s:?}, expected one of: {}",
                    Self::ALL.map(|style| style.name()).join(", ")
                ),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_round_trip() {
        for style in StyleId::ALL {
            assert_eq!(style.name().parse::<StyleId>().unwrap(), style);
        }
        assert_eq!("Rain-Princess".parse::<StyleId>().unwrap(), StyleId::RainPrincess);
    }

    #[test]
    fn test_unknown_name_rejected() {
        assert!(matches!(
            "starry-night".parse::<StyleId>(),
            Err(Error::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_artifact_table_is_consistent() {
        for style in StyleId::ALL {
            let file = style.artifact_file_name();
            assert_eq!(file, format!("{}-9.onnx", style.name()));
            assert!(style.download_url().ends_with(file));
        }
    }
}
