// Centralized ingestion limits to harden against untrusted map files

// Raw file size cap, checked before decoding
pub const MAX_SVG_BYTES: usize = 32 * 1024 * 1024;

// Parsed document caps
pub const MAX_XML_NODES: u32 = 2_000_000;
pub const MAX_REGIONS: usize = 50_000;

#[inline]
pub fn within_size(len: usize) -> bool { len <= MAX_SVG_BYTES }

#[inline]
pub fn within_region_cap(count: usize) -> bool { count <= MAX_REGIONS }
