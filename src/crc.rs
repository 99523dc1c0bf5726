/// CRC-32 (ISO-HDLC / zlib / PNG)
/// Parameters:
/// - Poly:    0x04C11DB7 (reflected: 0xEDB88320)
/// - Init:    0xFFFFFFFF
/// - RefIn:   true
/// - RefOut:  true
/// - XorOut:  0xFFFFFFFF
///
/// Check value for "123456789" is 0xCBF43926, same as `zlib.crc32`.
/// The PRAY2 trailer stores it little-endian.

const POLY_REFLECTED: u32 = 0xEDB8_8320;

/// Byte-at-a-time lookup table, built at compile time.
static TABLE: [u32; 256] = build_table();

const fn build_table() -> [u32; 256] {
    let mut table = [0u32; 256];
    let mut i = 0;
    while i < 256 {
        let mut crc = i as u32;
        let mut bit = 0;
        while bit < 8 {
            crc = if crc & 1 != 0 {
                (crc >> 1) ^ POLY_REFLECTED
            } else {
                crc >> 1
            };
            bit += 1;
        }
        table[i] = crc;
        i += 1;
    }
    table
}

/// CRC-32 of `data`.
pub fn crc32(data: &[u8]) -> u32 {
    let mut crc: u32 = 0xFFFF_FFFF;
    for &byte in data {
        let idx = ((crc ^ byte as u32) & 0xFF) as usize;
        crc = (crc >> 8) ^ TABLE[idx];
    }
    crc ^ 0xFFFF_FFFF
}

/// CRC-32 as the 4 trailer bytes (little endian).
pub fn crc32_le_bytes(data: &[u8]) -> [u8; 4] {
    crc32(data).to_le_bytes()
}
