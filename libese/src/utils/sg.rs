//! Scatter-gather helpers.
//!
//! TX and RX data are passed as ordered lists of byte segments that need not
//! be contiguous. None of these helpers allocate; running out of segments
//! shows up as a short count which callers compare against what they asked
//! for.

/// Sum of all segment lengths. Saturates instead of wrapping.
pub fn total_len<B: AsRef<[u8]>>(segments: &[B]) -> usize {
    segments
        .iter()
        .fold(0usize, |acc, seg| acc.saturating_add(seg.as_ref().len()))
}

/// Copy up to `dst.len()` bytes, starting `start_offset` bytes into the
/// segment list, into a flat buffer. Returns the number of bytes copied.
pub fn copy_into_flat<B: AsRef<[u8]>>(segments: &[B], start_offset: usize, dst: &mut [u8]) -> usize {
    let mut skip = start_offset;
    let mut copied = 0usize;
    for seg in segments {
        if copied == dst.len() {
            break;
        }
        let seg = seg.as_ref();
        if skip >= seg.len() {
            skip -= seg.len();
            continue;
        }
        let src = &seg[skip..];
        skip = 0;
        let n = src.len().min(dst.len() - copied);
        dst[copied..copied + n].copy_from_slice(&src[..n]);
        copied += n;
    }
    copied
}

/// Copy a flat buffer into the segment list starting `start_offset` bytes in.
/// Returns the number of bytes written.
pub fn copy_from_flat<B: AsMut<[u8]>>(segments: &mut [B], start_offset: usize, src: &[u8]) -> usize {
    let mut skip = start_offset;
    let mut written = 0usize;
    for seg in segments.iter_mut() {
        if written == src.len() {
            break;
        }
        let seg = seg.as_mut();
        if skip >= seg.len() {
            skip -= seg.len();
            continue;
        }
        let dst = &mut seg[skip..];
        skip = 0;
        let n = dst.len().min(src.len() - written);
        dst[..n].copy_from_slice(&src[written..written + n]);
        written += n;
    }
    written
}
