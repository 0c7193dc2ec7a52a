use ov_root::fixtures::{HistSpec, RootFileBuilder};
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::time::{SystemTime, UNIX_EPOCH};

const TRUTH: &str = "hInvMassEl_eta0to1.4442_pt30to2500_RECOden";
const METHOD: &str = "hInvMassEl_eta0to1.4442_pt30to2500_DTnum";

fn bin_path() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_overlay"))
}

fn tmp_path(filename: &str) -> PathBuf {
    let nanos = SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_nanos();
    let mut p = std::env::temp_dir();
    p.push(format!("overlay_cli_{}_{}_{}", std::process::id(), nanos, filename));
    p
}

fn run(args: &[&str]) -> Output {
    Command::new(bin_path())
        .args(args)
        .output()
        .unwrap_or_else(|e| panic!("failed to run {:?} {:?}: {}", bin_path(), args, e))
}

/// Reference integral 10; the compared histogram lives in `methods/`.
fn write_tagprobe(path: &Path, method_contents: Vec<f64>) {
    write_pair(path, vec![1.0, 2.0, 4.0, 2.0, 1.0], method_contents);
}

fn write_pair(path: &Path, truth_contents: Vec<f64>, method_contents: Vec<f64>) {
    RootFileBuilder::new()
        .histogram(
            HistSpec::uniform(TRUTH, "RECO", 60.0, 120.0, truth_contents)
                .with_x_title("m_{ee} [GeV]"),
        )
        .directory("methods", |d| {
            d.histogram(HistSpec::uniform(METHOD, "DT", 60.0, 120.0, method_contents))
        })
        .compressed(true)
        .write_to(path)
        .unwrap();
}

fn s(p: &Path) -> String {
    p.to_string_lossy().into_owned()
}

#[test]
fn compare_prints_kappa_and_writes_plot() {
    let input = tmp_path("tagprobe.root");
    let plot = tmp_path("overlay.svg");
    let artifact = tmp_path("overlay.json");
    write_tagprobe(&input, vec![0.0, 0.5, 1.0, 0.5, 0.0]);

    let method = format!("methods/{METHOD}");
    let out = run(&[
        "compare",
        "--input",
        &s(&input),
        "--reference",
        TRUTH,
        "--compare",
        &method,
        "--output",
        &s(&plot),
        "--artifact",
        &s(&artifact),
    ]);
    assert!(
        out.status.success(),
        "compare should succeed, stderr={}",
        String::from_utf8_lossy(&out.stderr)
    );
    assert_eq!(String::from_utf8_lossy(&out.stdout), "Kappa is 0.2\n");

    let svg = std::fs::read_to_string(&plot).unwrap();
    assert!(svg.contains(">method / truth</text>"));
    assert!(svg.contains(">m_{ee} [GeV]</text>"));

    let v: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&artifact).unwrap()).unwrap();
    assert_eq!(v["schema_version"], "overlay_v1");
    assert_eq!(v["compared"][0]["kappa"].as_f64().unwrap(), 0.2);
    assert_eq!(v["meta"]["input"]["sha256"].as_str().unwrap().len(), 64);
}

#[test]
fn compare_repeats_kappa_per_histogram() {
    let input = tmp_path("tagprobe_multi.root");
    let plot = tmp_path("multi.svg");
    write_tagprobe(&input, vec![0.0, 0.5, 1.0, 0.5, 0.0]);

    let method = format!("methods/{METHOD}");
    let out = run(&[
        "compare", "-i", &s(&input), "-r", TRUTH, "-c", &method, "-c", TRUTH, "-o", &s(&plot),
        "--linear", "--y-range", "0", "0.6", "--ratio-range", "0", "3", "--theme", "minimal",
    ]);
    assert!(out.status.success(), "stderr={}", String::from_utf8_lossy(&out.stderr));
    assert_eq!(String::from_utf8_lossy(&out.stdout), "Kappa is 0.2\nKappa is 1.0\n");
}

fn kappa_line(truth: Vec<f64>, method: Vec<f64>, tag: &str) -> String {
    let input = tmp_path(&format!("tagprobe_{tag}.root"));
    let plot = tmp_path(&format!("{tag}.svg"));
    write_pair(&input, truth, method);

    let method_key = format!("methods/{METHOD}");
    let out = run(&["compare", "-i", &s(&input), "-r", TRUTH, "-c", &method_key, "-o", &s(&plot)]);
    assert!(out.status.success(), "stderr={}", String::from_utf8_lossy(&out.stderr));
    String::from_utf8_lossy(&out.stdout).into_owned()
}

#[test]
fn kappa_of_repeating_ratio_has_twelve_digits() {
    let line = kappa_line(vec![1.0, 1.0, 1.0, 0.0, 0.0], vec![1.0, 0.0, 0.0, 0.0, 0.0], "third");
    assert_eq!(line, "Kappa is 0.333333333333\n");
}

#[test]
fn large_kappa_uses_exponent_notation() {
    let line = kappa_line(vec![1.0, 0.0, 0.0, 0.0, 0.0], vec![1e20, 0.0, 0.0, 0.0, 0.0], "large");
    assert_eq!(line, "Kappa is 1e+20\n");
}

#[test]
fn missing_key_fails() {
    let input = tmp_path("tagprobe_missing.root");
    let plot = tmp_path("missing.svg");
    write_tagprobe(&input, vec![0.0, 0.5, 1.0, 0.5, 0.0]);

    let out = run(&[
        "compare", "--input", &s(&input), "--reference", TRUTH, "--compare", "methods/nope",
        "--output", &s(&plot),
    ]);
    assert!(!out.status.success());
    assert!(out.stdout.is_empty());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("key not found"), "stderr={stderr}");
    assert!(!plot.exists());
}

#[test]
fn zero_integral_fails() {
    let input = tmp_path("tagprobe_zero.root");
    let plot = tmp_path("zero.svg");
    write_tagprobe(&input, vec![0.0; 5]);

    let method = format!("methods/{METHOD}");
    let out = run(&[
        "compare", "--input", &s(&input), "--reference", TRUTH, "--compare", &method,
        "--output", &s(&plot),
    ]);
    assert!(!out.status.success());
    assert!(out.stdout.is_empty());
    assert!(String::from_utf8_lossy(&out.stderr).contains("unusable integral"));
}

#[test]
fn not_a_root_file_fails() {
    let input = tmp_path("not_root.root");
    std::fs::write(&input, vec![b'x'; 128]).unwrap();
    let out = run(&["compare", "-i", &s(&input), "-r", TRUTH, "-c", METHOD]);
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("bad magic"));
}

#[test]
fn invalid_config_override_fails() {
    let input = tmp_path("tagprobe_cfg.root");
    let plot = tmp_path("cfg.svg");
    write_tagprobe(&input, vec![0.0, 0.5, 1.0, 0.5, 0.0]);

    let method = format!("methods/{METHOD}");
    // Log axis with a zero lower bound.
    let out = run(&[
        "compare", "-i", &s(&input), "-r", TRUTH, "-c", &method, "-o", &s(&plot),
        "--y-range", "0", "1",
    ]);
    assert!(!out.status.success());
    assert!(!plot.exists());
}

#[test]
fn ls_lists_keys() {
    let input = tmp_path("tagprobe_ls.root");
    write_tagprobe(&input, vec![0.0, 0.5, 1.0, 0.5, 0.0]);

    let out = run(&["ls", "--input", &s(&input)]);
    assert!(out.status.success(), "stderr={}", String::from_utf8_lossy(&out.stderr));
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert_eq!(stdout, format!("{TRUTH}\tTH1D\t1\nmethods\tTDirectoryFile\t1\n"));

    let out = run(&["ls", "--input", &s(&input), "--dir", "methods"]);
    assert!(out.status.success());
    assert_eq!(String::from_utf8_lossy(&out.stdout), format!("{METHOD}\tTH1D\t1\n"));
}

#[test]
fn render_saved_artifact() {
    let input = tmp_path("tagprobe_render.root");
    let first = tmp_path("first.svg");
    let artifact = tmp_path("render.json");
    let second = tmp_path("second.svg");
    let config = tmp_path("render.yaml");
    write_tagprobe(&input, vec![0.0, 0.5, 1.0, 0.5, 0.0]);
    std::fs::write(&config, "experiment:\n  status: Preliminary\n").unwrap();

    let method = format!("methods/{METHOD}");
    let out = run(&[
        "compare", "-i", &s(&input), "-r", TRUTH, "-c", &method, "-o", &s(&first),
        "--artifact", &s(&artifact),
    ]);
    assert!(out.status.success(), "stderr={}", String::from_utf8_lossy(&out.stderr));

    let out = run(&[
        "render", "--input", &s(&artifact), "--output", &s(&second), "--config", &s(&config),
    ]);
    assert!(out.status.success(), "stderr={}", String::from_utf8_lossy(&out.stderr));
    let svg = std::fs::read_to_string(&second).unwrap();
    assert!(svg.contains(">Preliminary</text>"));
}

#[test]
fn version_prints_crate_version() {
    let out = run(&["version"]);
    assert!(out.status.success());
    assert!(String::from_utf8_lossy(&out.stdout).starts_with("overlay "));
}
