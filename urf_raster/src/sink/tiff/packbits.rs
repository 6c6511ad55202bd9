//! PackBits as used by TIFF compression 32773.
//!
//! A header byte `n` is followed by `n + 1` literal bytes when `0 <= n <= 127`,
//! or by one byte repeated `1 - n` times when `-127 <= n <= -1`. `-128` is a
//! no-op and never emitted.

const MAX_RUN: usize = 128;

/// Append the PackBits encoding of `data` to `out`.
pub fn compress(data: &[u8], out: &mut Vec<u8>) {
    let mut pos = 0;
    while pos < data.len() {
        let run = data[pos..]
            .iter()
            .take(MAX_RUN)
            .take_while(|&&b| b == data[pos])
            .count();
        if run >= 2 {
            out.push((1 - run as i32) as i8 as u8);
            out.push(data[pos]);
            pos += run;
            continue;
        }
        let start = pos;
        pos += 1;
        while pos < data.len() && pos - start < MAX_RUN {
            if pos + 1 < data.len() && data[pos] == data[pos + 1] {
                break;
            }
            pos += 1;
        }
        out.push((pos - start - 1) as u8);
        out.extend_from_slice(&data[start..pos]);
    }
}

#[cfg(test)]
pub(crate) fn decompress(mut data: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    while let Some((&header, rest)) = data.split_first() {
        let header = header as i8;
        match header {
            -128 => data = rest,
            0..=127 => {
                let count = header as usize + 1;
                out.extend_from_slice(&rest[..count]);
                data = &rest[count..];
            }
            -127..=-1 => {
                let count = (1 - header as i32) as usize;
                out.resize(out.len() + count, rest[0]);
                data = &rest[1..];
            }
        }
    }
    out
}
