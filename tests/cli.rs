use pngtext::chunk::{chunk_crc, PNG_MAGIC};
use std::{
    fs,
    io::Write,
    process::{Command, Stdio},
};

fn chunk(tag: &[u8; 4], payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&(payload.len() as u32).to_be_bytes());
    out.extend_from_slice(tag);
    out.extend_from_slice(payload);
    out.extend_from_slice(&chunk_crc(tag, payload).to_be_bytes());
    out
}

fn sample_png() -> Vec<u8> {
    let mut png = PNG_MAGIC.to_vec();
    png.extend(chunk(b"IHDR", &[0, 0, 0, 1, 0, 0, 0, 1, 8, 0, 0, 0, 0]));
    png.extend(chunk(b"IDAT", &[0x78, 0x9c, 0x63, 0x60, 0x00, 0x00]));
    png.extend(chunk(b"IEND", b""));
    png
}

fn pngtext() -> Command {
    Command::new(env!("CARGO_BIN_EXE_pngtext"))
}

#[test]
fn file_to_file() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("in.png");
    let output = dir.path().join("out.png");
    fs::write(&input, sample_png()).unwrap();

    let out = pngtext()
        .args([input.as_os_str(), output.as_os_str()])
        .args(["Author", "someone"])
        .output()
        .unwrap();
    assert!(out.status.success());

    let stdout = String::from_utf8(out.stdout).unwrap();
    assert!(stdout.contains("Wrote 4 chunks to"));
    assert!(stdout.contains("new tEXt chunk inserted at chunk 1"));

    let written = fs::read(&output).unwrap();
    let text = chunk(b"tEXt", b"Author\0someone");
    let ihdr_end = 8 + 13 + 12;
    assert_eq!(&written[ihdr_end..ihdr_end + text.len()], text.as_slice());
    assert_eq!(written.len(), sample_png().len() + text.len());
}

#[test]
fn stdin_to_stdout_keeps_summary_off_the_image() {
    let mut child = pngtext()
        .args(["-", "-", "--json", "Comment", "hi"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();
    child
        .stdin
        .take()
        .unwrap()
        .write_all(&sample_png())
        .unwrap();
    let out = child.wait_with_output().unwrap();
    assert!(out.status.success());

    assert_eq!(&out.stdout[..8], &PNG_MAGIC[..]);
    assert_eq!(out.stdout.len(), sample_png().len() + 10 + 12);

    let stderr = String::from_utf8(out.stderr).unwrap();
    let report: serde_json::Value = serde_json::from_str(stderr.lines().last().unwrap()).unwrap();
    assert_eq!(report["chunks_written"], 4);
    assert_eq!(report["injected_at"], 1);
}

#[test]
fn corrupt_input_fails() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("in.png");
    let mut png = sample_png();
    let last = png.len() - 1;
    png[last] ^= 0xff;
    fs::write(&input, png).unwrap();

    let out = pngtext()
        .arg(&input)
        .arg(dir.path().join("out.png"))
        .args(["Comment", "hi"])
        .output()
        .unwrap();
    assert!(!out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("bad CRC on IEND chunk"));
}

#[test]
fn missing_input_fails() {
    let dir = tempfile::tempdir().unwrap();
    let out = pngtext()
        .arg(dir.path().join("nope.png"))
        .arg(dir.path().join("out.png"))
        .args(["Comment", "hi"])
        .output()
        .unwrap();
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("unable to open input file"));
}

#[test]
fn max_chunk_size_rejects_big_chunks() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("in.png");
    fs::write(&input, sample_png()).unwrap();

    let out = pngtext()
        .arg(&input)
        .arg(dir.path().join("out.png"))
        .args(["--max-chunk-size", "20", "Comment", "hi"])
        .output()
        .unwrap();
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("unable to allocate 25 bytes"));
}
