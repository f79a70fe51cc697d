//! Rendered decks and their output forms.

use crate::package::Package;
use crate::parser::{DeckParser, RenderedSlide};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use slidegen_core::{Error, Result};
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Standard extension of generated decks.
pub const DECK_EXTENSION: &str = "pptx";

/// A finished deck, owned by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deck {
    package: Package,
}

/// Where a deck should end up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputTarget {
    /// Write to this exact path.
    File(PathBuf),
    /// Write to a fresh uniquely named file in this directory.
    Directory(PathBuf),
    /// Keep in memory as bytes and base64 text.
    Encoded,
}

/// The rendered output handed to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeckArtifact {
    /// The deck was written to this path.
    File(PathBuf),
    /// The deck as bytes plus their base64 encoding.
    Encoded { bytes: Vec<u8>, base64: String },
}

impl Deck {
    pub(crate) fn from_package(package: Package) -> Self {
        Self { package }
    }

    /// Decode a deck from `.pptx` bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let package = Package::from_bytes(bytes)?;
        match package.main_part()? {
            Some(part) if package.contains(&part) => Ok(Self { package }),
            _ => Err(Error::DecodeError(
                "Archive is not a presentation package".to_string(),
            )),
        }
    }

    /// Decode a deck from base64 text.
    pub fn from_base64(encoded: &str) -> Result<Self> {
        let bytes = STANDARD
            .decode(encoded.trim())
            .map_err(|e| Error::DecodeError(format!("Invalid base64: {}", e)))?;
        Self::from_bytes(&bytes)
    }

    /// The underlying package.
    pub fn package(&self) -> &Package {
        &self.package
    }

    /// Serialize to `.pptx` bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        self.package.to_bytes()
    }

    /// Serialize to base64 text.
    pub fn to_base64(&self) -> Result<String> {
        Ok(STANDARD.encode(self.to_bytes()?))
    }

    /// Write the deck to `path`.
    ///
    /// The archive is built in memory first, so a failed render never
    /// leaves a truncated file behind.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        fs::write(path, self.to_bytes()?)?;
        log::info!("Saved deck to {}", path.display());
        Ok(())
    }

    /// Write the deck to a new `<uuid>.pptx` file in `dir`, creating the
    /// directory if needed.
    pub fn save_to_dir(&self, dir: impl AsRef<Path>) -> Result<PathBuf> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;

        let path = dir.join(format!("{}.{}", Uuid::new_v4(), DECK_EXTENSION));
        self.save(&path)?;
        Ok(path)
    }

    /// Slide text in presentation order, title slide included.
    pub fn slides(&self) -> Result<Vec<RenderedSlide>> {
        DeckParser::new().parse(&self.package)
    }

    /// Number of slides.
    pub fn slide_count(&self) -> Result<usize> {
        Ok(self.slides()?.len())
    }

    /// Hand the deck over in the requested form.
    pub fn into_artifact(self, target: OutputTarget) -> Result<DeckArtifact> {
        match target {
            OutputTarget::File(path) => {
                self.save(&path)?;
                Ok(DeckArtifact::File(path))
            }
            OutputTarget::Directory(dir) => Ok(DeckArtifact::File(self.save_to_dir(dir)?)),
            OutputTarget::Encoded => {
                let bytes = self.to_bytes()?;
                let base64 = STANDARD.encode(&bytes);
                Ok(DeckArtifact::Encoded { bytes, base64 })
            }
        }
    }
}

impl DeckArtifact {
    /// Path of a file artifact.
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::File(path) => Some(path),
            Self::Encoded { .. } => None,
        }
    }

    /// Base64 text of an encoded artifact.
    pub fn base64(&self) -> Option<&str> {
        match self {
            Self::File(_) => None,
            Self::Encoded { base64, .. } => Some(base64),
        }
    }
}
