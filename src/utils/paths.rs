use std::path::{Path, PathBuf};

/// `dir/name.inp` + `_CV-Tank` -> `dir/name_CV-Tank.inp`
pub fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
  let stem = path.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default();
  let file_name = match path.extension() {
    Some(ext) => format!("{}{}.{}", stem, suffix, ext.to_string_lossy()),
    None => format!("{}{}", stem, suffix),
  };
  path.with_file_name(file_name)
}

/// `dir/name.inp` + `_Demands`, `csv` -> `dir/name_Demands.csv`
pub fn sibling(path: &Path, suffix: &str, extension: &str) -> PathBuf {
  let stem = path.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default();
  path.with_file_name(format!("{}{}.{}", stem, suffix, extension))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn suffix_goes_before_extension() {
    assert_eq!(with_suffix(Path::new("nets/a.b.inp"), "_FCV-EM"), PathBuf::from("nets/a.b_FCV-EM.inp"));
    assert_eq!(with_suffix(Path::new("net"), "_4hr"), PathBuf::from("net_4hr"));
    assert_eq!(sibling(Path::new("x/net_Outlet-Outfall.inp"), "_Demands", "csv"), PathBuf::from("x/net_Outlet-Outfall_Demands.csv"));
  }
}
