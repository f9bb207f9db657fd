//! Pristine path scheme (§4.7): `<wcroot>/.svn/pristine/<hex[0..2]>/<hex>`.
//!
//! Grounded literally in `wc_db_pristine.c`'s `get_pristine_fname`: the
//! admin directory name, the `pristine` storage subdirectory, and the
//! two-hex-character fan-out directory are all fixed constants, not
//! configuration.

use std::path::{Path, PathBuf};

use wcdb_core::types::Sha1Checksum;

const ADM_DIR: &str = ".svn";
const PRISTINE_STORAGE_RELPATH: &str = "pristine";

/// The directory holding all fan-out subdirectories for one working copy's
/// pristine store: `<wcroot>/.svn/pristine`.
pub fn pristine_base_dir(wcroot_abspath: &Path) -> PathBuf {
    wcroot_abspath.join(ADM_DIR).join(PRISTINE_STORAGE_RELPATH)
}

/// The fan-out subdirectory a given checksum's pristine file lives under:
/// `<wcroot>/.svn/pristine/<hex[0..2]>`.
pub fn pristine_subdir(wcroot_abspath: &Path, sha1: &Sha1Checksum) -> PathBuf {
    pristine_base_dir(wcroot_abspath).join(sha1.hex_prefix())
}

/// The canonical on-disk path for a pristine text, whether or not it
/// currently exists: `<wcroot>/.svn/pristine/<hex[0..2]>/<hex>`.
pub fn pristine_fname(wcroot_abspath: &Path, sha1: &Sha1Checksum) -> PathBuf {
    pristine_subdir(wcroot_abspath, sha1).join(sha1.to_hex())
}

/// The directory new pristine texts are first written to before being
/// renamed into place. The source renames `TEMPFILE_ABSPATH` in from
/// `PRISTINE_TEMPDIR_RELPATH`, which is the empty string — i.e. the admin
/// directory itself.
pub fn pristine_tempdir(wcroot_abspath: &Path) -> PathBuf {
    wcroot_abspath.join(ADM_DIR)
}
