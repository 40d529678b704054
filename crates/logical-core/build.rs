/// Builds the gRPC client and server code for the `logical.proto` definition
/// using `tonic-prost-build`.
///
/// Alongside the generated Rust modules, a serialized file descriptor set is
/// written to `OUT_DIR` so the server can expose gRPC reflection.
///
/// # Files and Paths
///
/// - Proto file: `proto/logical.proto`
/// - Includes: `proto/`
///
/// # Panics
///
/// Panics if `OUT_DIR` is unset or code generation fails; both abort the build.
///
/// # Output
///
/// ```rust,ignore
/// pub mod proto {
///     tonic::include_proto!("logical");
/// }
/// ```
use std::env;
use std::path::PathBuf;

fn main() {
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());
    let descriptor_path = out_dir.join("logical_descriptor.bin");

    let mut config = tonic_prost_build::Config::new();
    config.file_descriptor_set_path(&descriptor_path);

    tonic_prost_build::configure()
        .compile_with_config(config, &["proto/logical.proto"], &["proto"])
        .unwrap();
}
