use anyhow::Result;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

pub fn display_text(bytes: &[u8]) -> String {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    match std::str::from_utf8(&bytes[..end]) {
        Ok(s) if !s.is_empty() && s.chars().all(|c| !c.is_control() || c == '\n') => s.to_string(),
        _ => format!("(binary {} B)", bytes.len()),
    }
}

pub fn hex_dump(bytes: &[u8]) -> String {
    let mut out = String::new();
    for (i, b) in bytes.iter().enumerate() {
        if i > 0 {
            if i % 16 == 0 {
                out.push('\n');
            } else {
                out.push(' ');
            }
        }
        out.push_str(&format!("{:02x}", b));
    }
    out
}

pub fn write_file(path: &Path, data: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let mut f = OpenOptions::new()
        .create(true)
        .truncate(true)
        .write(true)
        .open(path)?;
    f.write_all(data)?;
    f.sync_all()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_stops_at_nul() {
        let mut rec = b"03/14/2023 10:21:05".to_vec();
        rec.resize(40, 0);
        assert_eq!(display_text(&rec), "03/14/2023 10:21:05");
        assert_eq!(display_text(&[0x00, 0x00, 0x80, 0x3f]), "(binary 4 B)");
    }

    #[test]
    fn hex_wraps_every_16_bytes() {
        let s = hex_dump(&[0xabu8; 17]);
        assert_eq!(s.lines().count(), 2);
        assert!(s.starts_with("ab ab"));
    }
}
