use std::path::PathBuf;

use crate::cache::Cache;
use crate::reference::PackageRef;

/// Directory layout for one build of a package.
///
/// All paths live inside the package's cache entry; builds for
/// different binary keys never share directories.
#[derive(Debug, Clone, PartialEq)]
pub struct Layout {
    /// Exported sources the build compiles from.
    pub src_dir: PathBuf,
    /// Out-of-source build tree.
    pub build_dir: PathBuf,
    /// Generated toolchain and dependency config files.
    pub generators_dir: PathBuf,
    /// Staging directory the finished package is installed into.
    pub package_dir: PathBuf,
}

impl Layout {
    pub fn new(cache: &Cache, reference: &PackageRef, key: &str) -> Self {
        let build_dir = cache.build_dir(reference, key);
        let generators_dir = build_dir.join("generators");
        Layout {
            src_dir: cache.src_dir(reference),
            build_dir,
            generators_dir,
            package_dir: cache.package_dir(reference, key),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_paths() {
        let cache = Cache::new(PathBuf::from("/cache"));
        let reference: PackageRef = "xtuml_metadata/1.0@xtuml".parse().unwrap();
        let layout = Layout::new(&cache, &reference, "linux-gcc-Release-x86_64");

        let base = PathBuf::from("/cache/xtuml/xtuml_metadata/1.0");
        assert_eq!(layout.src_dir, base.join("src"));
        assert_eq!(layout.build_dir, base.join("build/linux-gcc-Release-x86_64"));
        assert_eq!(
            layout.generators_dir,
            base.join("build/linux-gcc-Release-x86_64/generators")
        );
        assert_eq!(layout.package_dir, base.join("pkg/linux-gcc-Release-x86_64"));
    }

    #[test]
    fn test_layouts_for_different_keys_do_not_overlap() {
        let cache = Cache::new(PathBuf::from("/cache"));
        let reference: PackageRef = "xtuml_metadata/1.0@xtuml".parse().unwrap();
        let release = Layout::new(&cache, &reference, "linux-gcc-Release-x86_64");
        let debug = Layout::new(&cache, &reference, "linux-gcc-Debug-x86_64");

        assert_ne!(release.build_dir, debug.build_dir);
        assert_ne!(release.package_dir, debug.package_dir);
        // Sources are exported once and shared between builds
        assert_eq!(release.src_dir, debug.src_dir);
    }
}
