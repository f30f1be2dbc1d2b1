use std::fs;
use std::path::{Path, PathBuf};

fn collect_rs_files(root: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    let mut stack = vec![root.to_path_buf()];
    while let Some(dir) = stack.pop() {
        if let Ok(read_dir) = fs::read_dir(&dir) {
            for entry in read_dir.flatten() {
                let path = entry.path();
                if path.is_dir() {
                    stack.push(path);
                } else if path.extension().map(|e| e == "rs").unwrap_or(false) {
                    files.push(path);
                }
            }
        }
    }
    files
}

fn file_contains(path: &Path, needle: &str) -> bool {
    fs::read_to_string(path)
        .map(|c| c.contains(needle))
        .unwrap_or(false)
}

/// Raw token material must stay at the seams that need it: the OAuth token
/// exchange, the manual-connect request body, and the dispatch bearer header.
/// Everything in between carries the sealed blob only, so a new module that
/// starts handling plaintext tokens shows up here before it ships.
#[test]
fn access_tokens_stay_at_the_vault_seams() {
    // workspace root = backend
    let manifest = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    let backend_root = manifest
        .parent()
        .expect("studio-service has a parent dir")
        .to_path_buf();

    let allowed = [
        // the sealed record definition and its round-trip tests
        "backend/libs/credential-vault/src/lib.rs",
        // OAuth code exchange builds the credentials from the provider response
        "backend/studio-service/src/services/oauth.rs",
        // manual connect accepts operator-provisioned tokens in the request
        "backend/studio-service/src/handlers/social_accounts.rs",
        // dispatch opens the sealed record for the bearer header
        "backend/studio-service/src/services/publish.rs",
    ];

    let mut offenders = Vec::new();
    for file in collect_rs_files(&backend_root) {
        let path_str = file.to_string_lossy();
        if allowed.iter().any(|a| path_str.ends_with(a))
            || path_str.ends_with("credential_boundary.rs")
        {
            continue;
        }
        if path_str.contains("/target/") {
            continue; // ignore generated code
        }
        if file_contains(&file, "access_token") || file_contains(&file, "refresh_token") {
            offenders.push(path_str.to_string());
        }
    }

    if !offenders.is_empty() {
        panic!(
            "Plaintext tokens must stay inside the vault seams (oauth exchange, connect request, dispatch). Offenders: {:?}",
            offenders
        );
    }
}

/// Unsealing is the narrowest operation of all: only the dispatcher turns a
/// sealed blob back into usable credentials.
#[test]
fn credential_unsealing_happens_only_in_dispatch() {
    let manifest = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    let src_root = manifest.join("src");

    let allowed = ["src/services/publish.rs"];

    let mut offenders = Vec::new();
    for file in collect_rs_files(&src_root) {
        let path_str = file.to_string_lossy();
        if allowed.iter().any(|a| path_str.ends_with(a)) {
            continue;
        }
        if file_contains(&file, ".open(&") {
            offenders.push(path_str.to_string());
        }
    }

    if !offenders.is_empty() {
        panic!(
            "Sealed credentials may only be opened on the dispatch path. Offenders: {:?}",
            offenders
        );
    }
}
