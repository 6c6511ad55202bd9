//! Decoding of URF (UNIRAST, Apple Raster) print streams.
//!
//! A URF file is a 12-byte file header followed by pages. Each page is a
//! 32-byte header and a run-length compressed raster body. This crate reads the
//! headers, decodes the bodies line by line into a [`sink::PixelSink`], and
//! ships BMP and TIFF sinks plus a driver writing one file per page.
//!
//! # Example
//!
//! ```rust
//! use futures::io::Cursor;
//! use std::pin::Pin;
//! use urf_raster::model::urf::{
//!     UrfColorSpace, UrfDuplex, UrfHeader, UrfMediaPosition, UrfMediaType, UrfPageHeader,
//!     UrfQuality,
//! };
//! use urf_raster::reader::UrfReader;
//! use urf_raster::sink::BmpSink;
//! use urf_raster::writer::UrfWriter;
//!
//! # futures::executor::block_on(async {
//! let page = UrfPageHeader {
//!     bits_per_pixel: 24,
//!     color_space: UrfColorSpace::sRGB,
//!     duplex: UrfDuplex::NoDuplex,
//!     quality: UrfQuality::Normal,
//!     media_position: UrfMediaPosition::Auto,
//!     media_type: UrfMediaType::Stationery,
//!     width: 2,
//!     height: 1,
//!     dot_per_inch: 300,
//! };
//!
//! // Build a one page file in memory.
//! let mut file = Vec::<u8>::new();
//! let mut writer = UrfWriter::new(Pin::new(&mut file), &UrfHeader { page_count: 1 }).await?;
//! writer.write_page(&page, &[0xff, 0x00, 0x00, 0x00, 0x00, 0xff]).await?;
//! writer.finish().await?;
//!
//! // Read it back page by page.
//! let mut cursor = Cursor::new(file);
//! let reader = UrfReader::new(Pin::new(&mut cursor)).await?;
//! let mut next = reader.next_page().await?;
//! while let Some(mut page) = next {
//!     let mut sink = BmpSink::for_page(page.header())?;
//!     page.decode_into(&mut sink).await?;
//!     let mut bitmap = Vec::new();
//!     sink.finish(&mut bitmap)?;
//!     assert_eq!(&bitmap[..2], b"BM");
//!     next = page.next_page().await?;
//! }
//! # Ok::<(), urf_raster::error::UrfError>(())
//! # }).unwrap();
//! ```

pub mod convert;
pub mod decode;
pub mod encode;
pub mod error;
pub mod model;
pub mod reader;
pub mod sink;
pub mod writer;

pub use byteorder;
