//! Build Script for Quote Service
//!
//! Generates Rust protobuf stubs from workspace proto definitions.
//!
//! # Panics Policy
//!
//! Build scripts use `.expect()` and panic on failure: a missing or invalid
//! proto definition must halt the build, and there is no caller to propagate
//! errors to.
#![allow(clippy::expect_used)]

use std::path::PathBuf;

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-changed=../../packages/proto/quote/");

    let manifest_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    let proto_root = manifest_dir.join("../../packages/proto");
    let proto_files = [proto_root.join("quote/v1/quote_service.proto")];

    for proto in &proto_files {
        println!("cargo:rerun-if-changed={}", proto.display());
    }

    // Descriptor set is compiled in-process; protoc is not required
    let fds = protox::compile(&proto_files, [&proto_root])
        .expect("Failed to compile proto definitions into a descriptor set");

    tonic_prost_build::configure()
        .build_client(true) // Enable client for integration tests
        .build_server(true)
        .compile_fds(fds)
        .expect("Failed to compile protobuf definitions");
}
