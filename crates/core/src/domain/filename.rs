// Local filename derivation for downloaded inputs

use super::Job;
use sha2::{Digest, Sha256};

const MAX_FILENAME_CHARS: usize = 200;
const EMPTY_FILENAME_FALLBACK: &str = "file.dat";
const URL_HASH_PREFIX_CHARS: usize = 12;

/// Replace every run of characters outside `[A-Za-z0-9._-]` with `_`
pub fn sanitize_filename(name: &str) -> String {
    let cleaned = name.trim().replace('\0', "");
    let mut out = String::with_capacity(cleaned.len());
    let mut in_run = false;
    for c in cleaned.chars() {
        if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
            out.push(c);
            in_run = false;
        } else if !in_run {
            out.push('_');
            in_run = true;
        }
    }
    let out: String = out.chars().take(MAX_FILENAME_CHARS).collect();
    if matches!(out.as_str(), "" | "." | "..") {
        EMPTY_FILENAME_FALLBACK.to_string()
    } else {
        out
    }
}

/// Filename for a job's input: its display name, or `upload_<hash>.dat`
/// derived from the file URL
pub fn pick_filename(job: &Job) -> String {
    let display = job.filename.as_deref().map(str::trim).unwrap_or_default();
    if !display.is_empty() {
        return sanitize_filename(display);
    }

    let url = job.file_url.as_deref().unwrap_or_default();
    let digest = format!("{:x}", Sha256::digest(url.as_bytes()));
    sanitize_filename(&format!("upload_{}.dat", &digest[..URL_HASH_PREFIX_CHARS]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_collapses_runs() {
        assert_eq!(sanitize_filename("my report (v2).txt"), "my_report_v2_.txt");
        assert_eq!(sanitize_filename("a//b\\\\c"), "a_b_c");
        assert_eq!(sanitize_filename("  ok-name_1.csv  "), "ok-name_1.csv");
    }

    #[test]
    fn test_sanitize_empty_and_long() {
        assert_eq!(sanitize_filename("   "), "file.dat");
        assert_eq!(sanitize_filename("\0"), "file.dat");
        assert_eq!(sanitize_filename("."), "file.dat");
        assert_eq!(sanitize_filename(" .. "), "file.dat");
        assert_eq!(sanitize_filename("..."), "...");
        assert_eq!(sanitize_filename(&"a".repeat(300)).len(), 200);
    }

    #[test]
    fn test_pick_filename_prefers_display_name() {
        let job = Job::new("J1", "https://x/in.txt").with_filename("Mutations List.txt");
        assert_eq!(pick_filename(&job), "Mutations_List.txt");
    }

    #[test]
    fn test_pick_filename_hash_fallback_is_deterministic() {
        let a = pick_filename(&Job::new("J1", "https://x/in.txt"));
        let b = pick_filename(&Job::new("J2", "https://x/in.txt").with_filename("  "));
        let c = pick_filename(&Job::new("J3", "https://x/other.txt"));

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(a.starts_with("upload_") && a.ends_with(".dat"));
        assert_eq!(a.len(), "upload_".len() + 12 + ".dat".len());
    }
}
