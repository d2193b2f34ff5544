//! C glue compiled into every artifact.
//!
//! The toolchain driver writes these files into a runtime directory next to
//! the build output:
//!
//! ```text
//! <rt>/include/libhtmc/libhtmc.h
//! <rt>/libhtmc.c
//! ```

/// `libhtmc/libhtmc.h`: handover layout and the API code spans call.
pub const LIBHTMC_H: &str = include_str!("../glue/include/libhtmc/libhtmc.h");

/// `libhtmc.c`: packs variadic calls into `htmc_arg_t` arrays.
pub const LIBHTMC_C: &str = include_str!("../glue/libhtmc.c");

/// Header location relative to the runtime directory.
pub const HEADER_PATH: &str = "include/libhtmc/libhtmc.h";

/// Glue source location relative to the runtime directory.
pub const SOURCE_PATH: &str = "libhtmc.c";

/// Include directory to pass as `-I`, relative to the runtime directory.
pub const INCLUDE_DIR: &str = "include";
