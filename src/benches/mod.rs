//! Built-in demonstration workloads.

use crate::workload::{RegistryError, WorkloadError, WorkloadRegistry};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::hint::black_box;
use std::io::{Read, Seek, SeekFrom, Write};

const SENTENCE: &str = "the quick brown fox jumps over the lazy dog";

/// Register the built-in workloads.
///
/// Projects consuming this crate can register their own workloads on the
/// same registry, before or after these.
pub fn register_benchmarks(registry: &mut WorkloadRegistry) -> Result<(), RegistryError> {
    registry
        .register_infallible("if_else", if_else())?
        .register_infallible("loops", loops)?
        .register_infallible("arrays", arrays())?
        .register_infallible("strings", strings)?
        .register_infallible("math", math())?
        .register_infallible("hashes", hashes())?
        .register("files", files())?;
    Ok(())
}

/// Deterministic filler bytes: `len` bytes cycling through `a..=z`.
fn filler_bytes(len: usize) -> Vec<u8> {
    (0..len).map(|i| b'a' + (i % 26) as u8).collect()
}

fn if_else() -> impl FnMut() {
    let mut i: u64 = 0;
    move || {
        let j = if i % 2 == 0 {
            1
        } else if i % 3 == 0 {
            2
        } else if i % 5 == 0 {
            3
        } else {
            4
        };
        black_box(j);
        i = i.wrapping_add(1);
    }
}

fn loops() {
    let mut j = 0u32;
    for _ in 0..100 {
        j = black_box(j + 1);
    }
    black_box(j);
}

fn arrays() -> impl FnMut() {
    let mut items: Vec<Vec<u8>> = Vec::new();
    move || {
        // bounded so long runs don't turn this into a memory benchmark
        if items.len() >= 4096 {
            items.clear();
        }
        items.push(filler_bytes(10));
        let needle = filler_bytes(10);
        black_box(items.iter().position(|item| *item == needle));
    }
}

fn strings() {
    let s = black_box(SENTENCE);
    black_box(s.to_uppercase());
    black_box(s.to_lowercase());
    black_box(s.trim());
    black_box(s.chars().rev().collect::<String>());
    black_box(s.len());
    black_box(s.replace(' ', "_"));
    black_box(s.split_whitespace().count());
}

fn math() -> impl FnMut() {
    let mut n: u64 = 0;
    move || {
        n += 1;
        let x = black_box(n as f64);
        black_box(x.abs());
        black_box((1.0 / x).acos());
        black_box((1.0 / x).asin());
        black_box(x.atan());
        black_box(format!("{:b}", n));
        black_box(x.exp());
        black_box(x.floor());
        black_box(x.is_finite());
        black_box(x.is_nan());
        black_box(x.ln());
        black_box(x.log10());
        black_box(x.ln_1p());
        black_box(x.powf(x));
        black_box(x.sin());
        black_box(x.sqrt());
        black_box(x.tan());
    }
}

fn hashes() -> impl FnMut() {
    let data = filler_bytes(1024);
    move || {
        let mut hasher = DefaultHasher::new();
        data.hash(&mut hasher);
        black_box(hasher.finish());
        black_box(adler32(&data));
        black_box(fnv1a(&data));
    }
}

fn adler32(data: &[u8]) -> u32 {
    const MOD: u32 = 65521;
    let (mut a, mut b) = (1u32, 0u32);
    for &byte in data {
        a = (a + u32::from(byte)) % MOD;
        b = (b + a) % MOD;
    }
    (b << 16) | a
}

fn fnv1a(data: &[u8]) -> u64 {
    data.iter().fold(0xcbf2_9ce4_8422_2325, |hash, &byte| {
        (hash ^ u64::from(byte)).wrapping_mul(0x0100_0000_01b3)
    })
}

/// Write, seek and read back a scratch file in the temp directory.
///
/// I/O errors fail the round instead of panicking.
fn files() -> impl FnMut() -> Result<(), WorkloadError> {
    let path = std::env::temp_dir().join(format!("iterbench-{}.tmp", std::process::id()));
    let mut size = 1usize;
    move || {
        // vary the payload between 1 byte and 512 KiB
        size = size * 31 % (512 * 1024) + 1;
        let payload = filler_bytes(size);

        let result = (|| -> std::io::Result<usize> {
            let mut file = std::fs::OpenOptions::new()
                .create(true)
                .truncate(true)
                .read(true)
                .write(true)
                .open(&path)?;
            file.write_all(&payload)?;
            let len = file.metadata()?.len();
            file.seek(SeekFrom::Start(len / 2))?;
            let mut buf = Vec::with_capacity(payload.len() / 2 + 1);
            let read = file.read_to_end(&mut buf)?;
            drop(file);
            std::fs::remove_file(&path)?;
            Ok(read)
        })();

        match result {
            Ok(read) => {
                black_box(read);
                Ok(())
            }
            Err(e) => Err(WorkloadError::new(format!("{}: {}", path.display(), e))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_register_every_builtin_when_registry_empty() {
        let mut registry = WorkloadRegistry::new();
        register_benchmarks(&mut registry).unwrap();
        assert_eq!(
            registry.names(),
            vec!["if_else", "loops", "arrays", "strings", "math", "hashes", "files"]
        );
    }

    #[test]
    fn should_reject_second_registration_when_names_clash() {
        let mut registry = WorkloadRegistry::new();
        register_benchmarks(&mut registry).unwrap();
        let err = register_benchmarks(&mut registry).unwrap_err();
        assert_eq!(err, RegistryError::Duplicate("if_else".to_string()));
    }

    #[test]
    fn should_complete_calls_when_invoked() {
        let mut registry = WorkloadRegistry::new();
        register_benchmarks(&mut registry).unwrap();
        for name in ["if_else", "loops", "arrays", "strings", "math", "hashes", "files"] {
            let entry = registry.get_mut(name).unwrap();
            entry.call().unwrap();
            entry.call().unwrap();
        }
    }

    #[test]
    fn should_match_known_adler32_when_hashing() {
        assert_eq!(adler32(b"Wikipedia"), 0x11E6_0398);
    }
}
