//! Fixed catalog of the three supported file kinds.
//!
//! Each kind differs only in string constants (storage subdirectory,
//! blob name prefix, file extension), so the catalog is a lookup table
//! over an enum rather than a type hierarchy.

use crate::error::Error;
use std::fmt;
use std::str::FromStr;

/// One of the three supported work-zone file kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FileKind {
    /// RSM messages in XML form.
    RsmXml,
    /// RSM messages in UPER (binary) form. Served as opaque bytes.
    RsmUper,
    /// WZDx feeds in GeoJSON form.
    Wzdx,
}

/// Naming constants for a file kind.
#[derive(Clone, Copy, Debug)]
pub struct KindSpec {
    /// Storage subdirectory holding blobs of this kind.
    pub subdir: &'static str,
    /// Prefix every blob name of this kind carries.
    pub name_prefix: &'static str,
    /// File extension (without the dot).
    pub extension: &'static str,
}

impl FileKind {
    /// All supported kinds, in route order.
    pub const ALL: [FileKind; 3] = [FileKind::RsmXml, FileKind::RsmUper, FileKind::Wzdx];

    /// Catalog entry for this kind.
    pub fn spec(self) -> KindSpec {
        match self {
            FileKind::RsmXml => KindSpec {
                subdir: "rsm-xml",
                name_prefix: "rsm-xml",
                extension: "xml",
            },
            FileKind::RsmUper => KindSpec {
                subdir: "rsm-uper",
                name_prefix: "rsm-uper",
                extension: "uper",
            },
            FileKind::Wzdx => KindSpec {
                subdir: "wzdx",
                name_prefix: "wzdx",
                extension: "geojson",
            },
        }
    }

    /// Route segment and listing endpoint name for this kind.
    pub fn as_str(self) -> &'static str {
        match self {
            FileKind::RsmXml => "rsm-xml",
            FileKind::RsmUper => "rsm-uper",
            FileKind::Wzdx => "wzdx",
        }
    }

    /// Whether blobs of this kind are opaque binary (no UTF-8 decode).
    pub fn is_binary(self) -> bool {
        matches!(self, FileKind::RsmUper)
    }

    /// RSM work zones may be split into `--i-of-N` numbered parts;
    /// WZDx feeds are always a single file.
    pub fn is_multipart(self) -> bool {
        matches!(self, FileKind::RsmXml | FileKind::RsmUper)
    }

    /// Listing prefix covering every blob of this kind.
    pub fn listing_prefix(self) -> String {
        format!("{}/", self.spec().subdir)
    }

    /// Listing prefix covering every part of one work-zone group.
    pub fn group_prefix(self, public_id: &str) -> String {
        let spec = self.spec();
        format!("{}/{}--{}", spec.subdir, spec.name_prefix, public_id)
    }

    /// The canonical stored name for a public id: the `1-of-1` part for
    /// the RSM kinds, the bare name for WZDx.
    pub fn canonical_key(self, public_id: &str) -> String {
        let spec = self.spec();
        if self.is_multipart() {
            format!("{}--1-of-1.{}", self.group_prefix(public_id), spec.extension)
        } else {
            format!("{}.{}", self.group_prefix(public_id), spec.extension)
        }
    }

    /// Derive the caller-facing id from a stored blob name.
    ///
    /// Strips the directory prefix, the `<prefix>--` lead-in, and a
    /// `--1-of-1.<ext>` (or bare `.<ext>`) tail. Best effort: a name
    /// that doesn't match the expected shape is returned unchanged.
    pub fn public_id(self, stored_name: &str) -> String {
        let spec = self.spec();
        let begin = format!("{}--", spec.name_prefix);
        let end = format!("--1-of-1.{}", spec.extension);
        let alt_end = format!(".{}", spec.extension);

        let mut name = stored_name.rsplit('/').next().unwrap_or(stored_name);
        if let Some(rest) = name.strip_prefix(begin.as_str()) {
            name = rest;
        }
        if let Some(rest) = name.strip_suffix(end.as_str()) {
            name = rest;
        } else if let Some(rest) = name.strip_suffix(alt_end.as_str()) {
            name = rest;
        }
        name.to_string()
    }
}

impl fmt::Display for FileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FileKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "rsm-xml" => Ok(FileKind::RsmXml),
            "rsm-uper" => Ok(FileKind::RsmUper),
            "wzdx" => Ok(FileKind::Wzdx),
            other => Err(Error::UnknownKind(other.to_string())),
        }
    }
}
