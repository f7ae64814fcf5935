//! Artifact renderers: raster charts, interactive documents, and the shared
//! HTML page helpers both the documents and the dashboard use.

pub mod interactive;
pub mod page;
pub mod static_charts;

use std::path::{Path, PathBuf};

use crate::artifact::Artifact;

/// Where `artifact` lands inside `dir`.
pub fn artifact_path(dir: &Path, artifact: Artifact) -> PathBuf {
    dir.join(artifact.file_name())
}

/// `1234567` → `"1,234,567"`.
pub fn thousands(n: usize) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thousands_separators() {
        assert_eq!(thousands(0), "0");
        assert_eq!(thousands(999), "999");
        assert_eq!(thousands(1000), "1,000");
        assert_eq!(thousands(1234567), "1,234,567");
    }
}
