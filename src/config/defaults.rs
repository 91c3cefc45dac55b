//! Default configuration values

/// Repository configuration file name
pub const CONFIG_FILE: &str = "pkgplan.toml";

/// Manifest file name of a unit
pub const MANIFEST_FILE: &str = "PKGBUILD";

/// Extension of built package archives
pub const ARCHIVE_SUFFIX: &str = ".pkg.tar.zst";

/// Metadata member inside a package archive
pub const PKGINFO_MEMBER: &str = ".PKGINFO";

/// Directory inside a unit where resolved dependency archives are staged
pub const DEPS_DIR: &str = "_deps";

/// Local file name for the downloaded repository database
pub const DB_DOWNLOAD_FILE: &str = "current_repo.db.tar.gz";

/// Asset cleanup list of files to delete
pub const DELETE_LIST_FILE: &str = "delete.txt";

/// Asset cleanup list of files to keep
pub const KEEP_LIST_FILE: &str = "keep.txt";

/// Default repository database URL; `{slug}` is `owner/repo`
pub const DB_URL_TEMPLATE: &str =
    "https://github.com/{slug}/releases/download/repository/{name}.db.tar.gz";

/// Maximum number of download retry attempts
pub const MAX_DOWNLOAD_RETRIES: u32 = 3;

/// Per-request download timeout in seconds
pub const DOWNLOAD_TIMEOUT_SECS: u64 = 300;

/// Base delay for download retry backoff in milliseconds
pub const RETRY_BASE_DELAY_MS: u64 = 1000;

/// Environment variable holding the `owner/repo` slug
pub const ENV_REPOSITORY: &str = "GITHUB_REPOSITORY";

/// Environment variable naming the CI output file
pub const ENV_OUTPUT: &str = "GITHUB_OUTPUT";

/// Minimum proptest iterations
pub const MIN_PROPTEST_ITERATIONS: u32 = 100;
