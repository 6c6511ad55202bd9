use futures::io::Cursor;
use honggfuzz::fuzz;
use std::pin::Pin;
use urf_raster::decode::Limits;
use urf_raster::reader::UrfReader;
use urf_raster_fuzz::roundtrip_urf;

fn main() {
    let rt = tokio::runtime::Runtime::new().unwrap();
    const LIMITS: Limits = Limits {
        bytes_per_line: 8000 * 4,
        bytes_per_page: 8000 * 8000 * 4,
        max_width: 8000,
        max_height: 8000,
    };

    loop {
        fuzz!(|input: &[u8]| {
            let _ = rt.block_on(async move {
                let mut input = Cursor::new(input);
                let reader = UrfReader::new_with_limits(Pin::new(&mut input), LIMITS).await?;
                roundtrip_urf(reader).await?;
                Ok::<(), Box<dyn std::error::Error>>(())
            });
        });
    }
}
