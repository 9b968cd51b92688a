// src/dump.rs
//! Hex dump helper for debug output

/// Render a labelled hex/ASCII dump of a byte buffer, 16 bytes per row.
pub fn hex_dump(title: &str, data: &[u8]) -> String {
    let mut out = format!("{} ({} bytes)\n", title, data.len());

    for (row, chunk) in data.chunks(16).enumerate() {
        let hex: Vec<String> = chunk.iter().map(|b| format!("{:02X}", b)).collect();
        let ascii: String = chunk
            .iter()
            .map(|&b| if (0x20..0x7F).contains(&b) { b as char } else { '.' })
            .collect();

        out.push_str(&format!("{:04X}:  {:<47}  {}\n", row * 16, hex.join(" "), ascii));
    }

    out
}

/// Print a labelled dump to stdout
pub fn dump(title: &str, data: &[u8]) {
    print!("{}", hex_dump(title, data));
}
