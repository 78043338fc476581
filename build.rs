//! Build script for refdupe.
//!
//! On Windows, embeds `refdupe.manifest` (via `refdupe.rc`) so the binary is
//! long-path aware. Recovered trees often nest well past the 260 character
//! `MAX_PATH` limit; with the manifest and the Windows 10 v1607+ registry
//! setting, paths up to 32,767 characters work.
//!
//! Nothing happens on other platforms.

fn main() {
    #[cfg(windows)]
    {
        embed_resource::compile("refdupe.rc", embed_resource::NONE);
        println!("cargo:rerun-if-changed=refdupe.rc");
        println!("cargo:rerun-if-changed=refdupe.manifest");
    }
}
