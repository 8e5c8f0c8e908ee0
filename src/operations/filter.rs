//! Color filters.
//!
//! Every filter except [`Filter::Interlace`] runs on each frame on its own.
//! Interlace only records an encoder hint on the canvas.

use super::{Apply, Context, OperationError};
use crate::imaging::{Canvas, Interlace};
use image::{DynamicImage, RgbaImage, imageops};
use serde::{Deserialize, Serialize};

const DEFAULT_SEPIA_THRESHOLD: f32 = 80.0;
const DEFAULT_BLUR_RADIUS: f32 = 5.0;
const DEFAULT_SOLARIZE_PERCENT: f32 = 30.0;
const DEFAULT_INTERLACE: &str = "plane";

fn default_sepia_threshold() -> f32 {
    DEFAULT_SEPIA_THRESHOLD
}

fn default_blur_radius() -> f32 {
    DEFAULT_BLUR_RADIUS
}

fn default_solarize_percent() -> f32 {
    DEFAULT_SOLARIZE_PERCENT
}

fn default_interlace() -> String {
    DEFAULT_INTERLACE.to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "filter", rename_all = "kebab-case")]
pub enum Filter {
    Grayscale,
    /// Threshold in percent, clamped to 0–100 when applied.
    Sepia {
        #[serde(default = "default_sepia_threshold")]
        threshold: f32,
    },
    /// Gaussian blur. `sigma` defaults to half the radius.
    Blur {
        #[serde(default = "default_blur_radius")]
        radius: f32,
        #[serde(default)]
        sigma: Option<f32>,
    },
    /// Both values in −100..=100.
    BrightnessContrast {
        #[serde(default)]
        brightness: f32,
        #[serde(default)]
        contrast: f32,
    },
    /// Channels above `percent` of full intensity are inverted.
    Solarize {
        #[serde(default = "default_solarize_percent")]
        percent: f32,
    },
    /// One of `gif`, `jpeg`, `plane`, `png`; anything else is ignored.
    Interlace {
        #[serde(default = "default_interlace")]
        scheme: String,
    },
}

impl Filter {
    /// Resolve a filter by name. Numeric arguments fill the parameters in
    /// declaration order; missing ones take their defaults.
    pub fn from_name(name: &str, args: &[f32]) -> Result<Self, OperationError> {
        let arg = |i: usize| args.get(i).copied();
        match name {
            "grayscale" => Ok(Self::Grayscale),
            "sepia" => Ok(Self::Sepia {
                threshold: arg(0).unwrap_or(DEFAULT_SEPIA_THRESHOLD),
            }),
            "blur" => Ok(Self::Blur {
                radius: arg(0).unwrap_or(DEFAULT_BLUR_RADIUS),
                sigma: arg(1),
            }),
            "brightness-contrast" => Ok(Self::BrightnessContrast {
                brightness: arg(0).unwrap_or(0.0),
                contrast: arg(1).unwrap_or(0.0),
            }),
            "solarize" => Ok(Self::Solarize {
                percent: arg(0).unwrap_or(DEFAULT_SOLARIZE_PERCENT),
            }),
            "interlace" => Ok(Self::interlace(DEFAULT_INTERLACE)),
            other => Err(OperationError::UnsupportedFilter(other.to_string())),
        }
    }

    pub fn interlace(scheme: &str) -> Self {
        Self::Interlace {
            scheme: scheme.to_string(),
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Self::Grayscale => "grayscale",
            Self::Sepia { .. } => "sepia",
            Self::Blur { .. } => "blur",
            Self::BrightnessContrast { .. } => "brightness-contrast",
            Self::Solarize { .. } => "solarize",
            Self::Interlace { .. } => "interlace",
        }
    }
}

impl Apply for Filter {
    fn key(&self) -> String {
        let args = match self {
            Self::Grayscale => String::new(),
            Self::Sepia { threshold } => format!(":{threshold}"),
            Self::Blur { radius, sigma } => match sigma {
                Some(sigma) => format!(":{radius}:{sigma}"),
                None => format!(":{radius}"),
            },
            Self::BrightnessContrast {
                brightness,
                contrast,
            } => format!(":{brightness}:{contrast}"),
            Self::Solarize { percent } => format!(":{percent}"),
            Self::Interlace { scheme } => format!(":{scheme}"),
        };
        format!("filter:{}{args}", self.name())
    }

    fn apply(&self, canvas: &mut Canvas, ctx: &mut Context<'_>) -> Result<(), OperationError> {
        match self {
            Self::Grayscale => canvas.map_frames(grayscale),
            Self::Sepia { threshold } => {
                let threshold = threshold.clamp(0.0, 100.0);
                canvas.for_each_frame(|img| sepia(img, threshold));
            }
            Self::Blur { radius, sigma } => {
                let radius = radius.max(0.0);
                let sigma = sigma.unwrap_or(radius / 2.0).max(0.0);
                if sigma > 0.0 {
                    canvas.map_frames(|img| imageops::blur(img, sigma));
                }
            }
            Self::BrightnessContrast {
                brightness,
                contrast,
            } => {
                let brightness = brightness.clamp(-100.0, 100.0);
                let contrast = contrast.clamp(-100.0, 100.0);
                let shift = (brightness * 2.55).round() as i32;
                canvas.map_frames(|img| {
                    let brightened = imageops::brighten(img, shift);
                    if contrast == 0.0 {
                        brightened
                    } else {
                        imageops::contrast(&brightened, contrast)
                    }
                });
            }
            Self::Solarize { percent } => {
                let threshold = (255.0 * percent.clamp(0.0, 100.0) / 100.0).round() as u8;
                canvas.for_each_frame(|img| solarize(img, threshold));
            }
            Self::Interlace { scheme } => match Interlace::from_name(scheme) {
                Some(interlace) => canvas.set_interlace(interlace),
                None => ctx.note(format!("interlace scheme '{scheme}' is not supported")),
            },
        }
        Ok(())
    }
}

fn grayscale(img: &RgbaImage) -> RgbaImage {
    DynamicImage::ImageLumaA8(imageops::grayscale_alpha(img)).to_rgba8()
}

/// Sepia toning on the 0–255 scale, `threshold` in percent.
fn sepia(img: &mut RgbaImage, threshold: f32) {
    let t = threshold / 100.0 * 255.0;
    let tone = t / 7.0;
    for px in img.pixels_mut() {
        let [r, g, b, _] = px.0;
        let intensity = 0.2126 * r as f32 + 0.7152 * g as f32 + 0.0722 * b as f32;

        let red = if intensity > t {
            255.0
        } else {
            intensity + 255.0 - t
        };
        let green_threshold = 7.0 * t / 6.0;
        let green = if intensity > green_threshold {
            255.0
        } else {
            intensity + 255.0 - green_threshold
        };
        let blue = if intensity < t / 6.0 {
            0.0
        } else {
            intensity - t / 6.0
        };

        px[0] = red.clamp(0.0, 255.0) as u8;
        px[1] = green.max(tone).clamp(0.0, 255.0) as u8;
        px[2] = blue.max(tone).clamp(0.0, 255.0) as u8;
    }
}

fn solarize(img: &mut RgbaImage, threshold: u8) {
    for px in img.pixels_mut() {
        for c in &mut px.0[..3] {
            if *c > threshold {
                *c = 255 - *c;
            }
        }
    }
}
