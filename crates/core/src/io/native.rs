//! Native GeoTIFF reading/writing (without GDAL dependency)
//!
//! Uses the `tiff` crate. Multi-band images must be pixel-interleaved
//! (PlanarConfiguration = 1), which is what most EO products ship.

use crate::crs::{CRS, WGS84_EPSG};
use crate::error::{Error, Result};
use crate::raster::{GeoTransform, Raster, RasterStack};
use std::fs::File;
use std::io::{BufReader, Cursor};
use std::path::Path;
use tiff::decoder::{Decoder, DecodingResult};
use tiff::encoder::colortype::{Gray32Float, RGB32Float, RGBA32Float};
use tiff::encoder::TiffEncoder;
use tiff::tags::Tag;

const MODEL_PIXEL_SCALE: u16 = 33550;
const MODEL_TIEPOINT: u16 = 33922;
const GEO_KEY_DIRECTORY: u16 = 34735;
const GDAL_NODATA: u16 = 42113;

const GEOGRAPHIC_TYPE_KEY: u16 = 2048;
const PROJECTED_CS_TYPE_KEY: u16 = 3072;
const USER_DEFINED: u16 = 32767;

/// Read every band of a GeoTIFF file into a stack
pub fn read_geotiff<P: AsRef<Path>>(path: P) -> Result<RasterStack> {
    let file = File::open(path.as_ref())?;
    decode_geotiff(BufReader::new(file))
}

/// Read a GeoTIFF from an in-memory buffer
pub fn read_geotiff_from_buffer(data: &[u8]) -> Result<RasterStack> {
    decode_geotiff(Cursor::new(data))
}

/// Internal: decode a GeoTIFF from any `Read + Seek` source
fn decode_geotiff<R>(reader: R) -> Result<RasterStack>
where
    R: std::io::Read + std::io::Seek,
{
    let mut decoder = Decoder::new(reader)?;

    let (width, height) = decoder.dimensions()?;
    let rows = height as usize;
    let cols = width as usize;
    if rows == 0 || cols == 0 {
        return Err(Error::InvalidDimensions {
            width: cols,
            height: rows,
        });
    }

    if let Ok(2) = decoder.get_tag_u32(Tag::PlanarConfiguration) {
        return Err(Error::UnsupportedDataType(
            "planar (band-sequential) TIFF layout".to_string(),
        ));
    }

    let data: Vec<f64> = match decoder.read_image()? {
        DecodingResult::F32(buf) => buf.into_iter().map(f64::from).collect(),
        DecodingResult::F64(buf) => buf,
        DecodingResult::U8(buf) => buf.into_iter().map(f64::from).collect(),
        DecodingResult::U16(buf) => buf.into_iter().map(f64::from).collect(),
        DecodingResult::U32(buf) => buf.into_iter().map(f64::from).collect(),
        DecodingResult::I8(buf) => buf.into_iter().map(f64::from).collect(),
        DecodingResult::I16(buf) => buf.into_iter().map(f64::from).collect(),
        DecodingResult::I32(buf) => buf.into_iter().map(f64::from).collect(),
        _ => {
            return Err(Error::UnsupportedDataType(
                "Unsupported TIFF pixel format".to_string(),
            ))
        }
    };

    let cells = rows * cols;
    if data.is_empty() || data.len() % cells != 0 {
        return Err(Error::InvalidDimensions {
            width: cols,
            height: rows,
        });
    }
    let band_count = data.len() / cells;

    let transform = read_geotransform(&mut decoder).ok();
    let crs = read_crs(&mut decoder);
    let nodata = read_nodata(&mut decoder);

    tracing::debug!(
        "Decoded GeoTIFF {}x{} with {} band(s), crs={:?}, nodata={:?}",
        cols,
        rows,
        band_count,
        crs.as_ref().map(CRS::identifier),
        nodata
    );

    let mut bands = Vec::with_capacity(band_count);
    for b in 0..band_count {
        let values: Vec<f64> = data.iter().skip(b).step_by(band_count).copied().collect();
        let mut band = Raster::from_vec(values, rows, cols)?;
        if let Some(transform) = transform {
            band.set_transform(transform);
        }
        band.set_crs(crs.clone());
        band.set_nodata(nodata);
        bands.push(band);
    }

    RasterStack::new(bands)
}

/// Attempt to read GeoTransform from TIFF tags
fn read_geotransform<R: std::io::Read + std::io::Seek>(
    decoder: &mut Decoder<R>,
) -> Result<GeoTransform> {
    let scale = decoder
        .get_tag_f64_vec(Tag::Unknown(MODEL_PIXEL_SCALE))
        .map_err(|_| Error::Other("No pixel scale tag".into()))?;

    let tiepoint = decoder
        .get_tag_f64_vec(Tag::Unknown(MODEL_TIEPOINT))
        .map_err(|_| Error::Other("No tiepoint tag".into()))?;

    if scale.len() >= 2 && tiepoint.len() >= 6 {
        // tiepoint: [I, J, K, X, Y, Z]
        // scale: [ScaleX, ScaleY, ScaleZ]
        let origin_x = tiepoint[3] - tiepoint[0] * scale[0];
        let origin_y = tiepoint[4] + tiepoint[1] * scale[1];
        let pixel_width = scale[0];
        let pixel_height = -scale[1]; // Negative for north-up

        return Ok(GeoTransform::new(origin_x, origin_y, pixel_width, pixel_height));
    }

    Err(Error::Other("Cannot determine geotransform".into()))
}

/// EPSG code from the GeoKey directory, projected CS preferred over geographic.
fn read_crs<R: std::io::Read + std::io::Seek>(decoder: &mut Decoder<R>) -> Option<CRS> {
    let keys = decoder
        .get_tag_u16_vec(Tag::Unknown(GEO_KEY_DIRECTORY))
        .ok()?;
    parse_geokeys(&keys).map(|code| CRS::from_epsg(u32::from(code)))
}

fn parse_geokeys(keys: &[u16]) -> Option<u16> {
    let count = *keys.get(3)? as usize;
    let mut geographic = None;
    let mut projected = None;

    for entry in keys.get(4..)?.chunks_exact(4).take(count) {
        let (key, location, value) = (entry[0], entry[1], entry[3]);
        // location 0 means the value is stored inline
        if location != 0 || value == 0 || value == USER_DEFINED {
            continue;
        }
        match key {
            PROJECTED_CS_TYPE_KEY => projected = Some(value),
            GEOGRAPHIC_TYPE_KEY => geographic = Some(value),
            _ => {}
        }
    }

    projected.or(geographic)
}

fn read_nodata<R: std::io::Read + std::io::Seek>(decoder: &mut Decoder<R>) -> Option<f64> {
    let text = decoder
        .get_tag_ascii_string(Tag::Unknown(GDAL_NODATA))
        .ok()?;
    text.trim_matches(|c: char| c == '\0' || c.is_whitespace())
        .parse::<f64>()
        .ok()
}

/// Encode a stack as an in-memory 32-bit float GeoTIFF.
///
/// Supports 1, 3 or 4 bands (gray, RGB and RGBA layouts).
pub fn write_geotiff_to_buffer(stack: &RasterStack) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    encode_geotiff(stack, Cursor::new(&mut buf))?;
    Ok(buf)
}

macro_rules! write_image {
    ($encoder:expr, $color:ty, $stack:expr, $data:expr) => {{
        let (rows, cols) = $stack.shape();
        let mut image = $encoder.new_image::<$color>(cols as u32, rows as u32)?;
        write_geo_tags(image.encoder(), $stack)?;
        image.write_data($data)?;
    }};
}

/// Internal: encode a stack as GeoTIFF into any `Write + Seek` sink
fn encode_geotiff<W>(stack: &RasterStack, writer: W) -> Result<()>
where
    W: std::io::Write + std::io::Seek,
{
    if stack.is_empty() {
        return Err(Error::InvalidDimensions {
            width: 0,
            height: 0,
        });
    }

    let mut encoder = TiffEncoder::new(writer)?;

    // Interleave bands pixel by pixel
    let bands = stack.bands();
    let (rows, cols) = stack.shape();
    let mut data: Vec<f32> = Vec::with_capacity(rows * cols * bands.len());
    for r in 0..rows {
        for c in 0..cols {
            for band in bands {
                data.push(band.data()[(r, c)] as f32);
            }
        }
    }

    match bands.len() {
        1 => write_image!(encoder, Gray32Float, stack, &data),
        3 => write_image!(encoder, RGB32Float, stack, &data),
        4 => write_image!(encoder, RGBA32Float, stack, &data),
        n => {
            return Err(Error::UnsupportedDataType(format!(
                "cannot encode {n} bands (expected 1, 3 or 4)"
            )))
        }
    }

    Ok(())
}

fn write_geo_tags<W: std::io::Write + std::io::Seek, K: tiff::encoder::TiffKind>(
    dir: &mut tiff::encoder::DirectoryEncoder<'_, W, K>,
    stack: &RasterStack,
) -> Result<()> {
    let gt = stack.transform().copied().unwrap_or_default();

    let scale = [gt.pixel_width, gt.pixel_height.abs(), 0.0];
    dir.write_tag(Tag::Unknown(MODEL_PIXEL_SCALE), &scale[..])?;

    let tiepoint = [0.0, 0.0, 0.0, gt.origin_x, gt.origin_y, 0.0];
    dir.write_tag(Tag::Unknown(MODEL_TIEPOINT), &tiepoint[..])?;

    // GTModelType (1 projected, 2 geographic), GTRasterType = PixelIsArea,
    // plus the EPSG code when known.
    let epsg = stack
        .crs()
        .map(CRS::epsg)
        .and_then(|code| u16::try_from(code).ok());
    let mut geokeys: Vec<u16> = vec![1, 1, 0, 2];
    match epsg {
        Some(code) if u32::from(code) == WGS84_EPSG || code == 4674 => {
            geokeys[3] = 3;
            geokeys.extend_from_slice(&[1024, 0, 1, 2, 1025, 0, 1, 1]);
            geokeys.extend_from_slice(&[GEOGRAPHIC_TYPE_KEY, 0, 1, code]);
        }
        Some(code) => {
            geokeys[3] = 3;
            geokeys.extend_from_slice(&[1024, 0, 1, 1, 1025, 0, 1, 1]);
            geokeys.extend_from_slice(&[PROJECTED_CS_TYPE_KEY, 0, 1, code]);
        }
        None => geokeys.extend_from_slice(&[1024, 0, 1, 1, 1025, 0, 1, 1]),
    }
    dir.write_tag(Tag::Unknown(GEO_KEY_DIRECTORY), &geokeys[..])?;

    if let Some(nodata) = stack.bands().first().and_then(Raster::nodata) {
        let text = nodata.to_string();
        dir.write_tag(Tag::Unknown(GDAL_NODATA), text.as_str())?;
    }

    Ok(())
}
