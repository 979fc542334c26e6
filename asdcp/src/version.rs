/// Version of this library, as recorded in the Identification set of written files.
pub const TOOLKIT_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Print the banner shown by `--version` in the command line tools.
///
/// `release` and `commit` come from the build environment and may be empty.
pub fn print_cli_version_banner(tool_name: &str, release: &str, commit: &str) {
    println!("{tool_name}");
    println!("AS-DCP track file toolkit");
    println!();

    println!("\tLibrary:     asdcp {TOOLKIT_VERSION}");
    if !release.is_empty() {
        println!("\tGit tag:     {release}");
    }
    if !commit.is_empty() {
        println!("\tGit commit:  {commit}");
    }
}
