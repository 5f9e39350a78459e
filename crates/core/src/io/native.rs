//! Native GeoTIFF reading/writing (without GDAL dependency)
//!
//! Uses the `tiff` crate for single-band TIFF I/O with the GeoTIFF tags the
//! pipeline relies on: ModelPixelScale + ModelTiepoint for the geotransform
//! and GDAL_NODATA for the nodata sentinel. Rasters are written in the
//! sample format matching the cell type (u8/u16/u32 and f32/f64 grayscale);
//! signed integer rasters are stored as unsigned of the same width. For full
//! CRS fidelity and tiled/compressed outputs, enable the `gdal` feature.

use crate::error::{Error, Result};
use crate::raster::{GeoTransform, Raster, RasterElement};
use num_traits::{NumCast, Zero};
use std::fs::File;
use std::io::Cursor;
use std::path::Path;
use tiff::decoder::{Decoder, DecodingResult};
use tiff::encoder::colortype::{self, ColorType};
use tiff::encoder::{TiffEncoder, TiffValue};
use tiff::tags::Tag;

/// ModelPixelScaleTag
const TAG_PIXEL_SCALE: u16 = 33550;
/// ModelTiepointTag
const TAG_TIEPOINT: u16 = 33922;
/// GeoKeyDirectoryTag
const TAG_GEO_KEYS: u16 = 34735;
/// GDAL_NODATA (ASCII)
const TAG_GDAL_NODATA: u16 = 42113;

/// Options for writing GeoTIFF files
#[derive(Debug, Clone)]
pub struct GeoTiffOptions {
    /// Compression (not supported in native mode, accepted for API parity)
    pub compression: String,
}

impl Default for GeoTiffOptions {
    fn default() -> Self {
        Self {
            compression: "NONE".to_string(),
        }
    }
}

/// Read a GeoTIFF file into a Raster
///
/// Native reader with limited GeoTIFF metadata support (geotransform and
/// nodata; CRS metadata requires the `gdal` feature).
pub fn read_geotiff<T, P>(path: P, band: Option<usize>) -> Result<Raster<T>>
where
    T: RasterElement,
    P: AsRef<Path>,
{
    let file = File::open(path.as_ref())?;
    decode_geotiff(file, band)
}

/// Read a GeoTIFF from an in-memory buffer into a Raster
///
/// Same as `read_geotiff` but operates on a byte slice instead of a file path.
pub fn read_geotiff_from_buffer<T>(data: &[u8], band: Option<usize>) -> Result<Raster<T>>
where
    T: RasterElement,
{
    let cursor = Cursor::new(data);
    decode_geotiff(cursor, band)
}

/// Internal: decode a GeoTIFF from any `Read + Seek` source
fn decode_geotiff<T, R>(reader: R, _band: Option<usize>) -> Result<Raster<T>>
where
    T: RasterElement,
    R: std::io::Read + std::io::Seek,
{
    let mut decoder = Decoder::new(reader)
        .map_err(|e| Error::Other(format!("TIFF decode error: {}", e)))?;

    let (width, height) = decoder.dimensions()
        .map_err(|e| Error::Other(format!("Cannot read dimensions: {}", e)))?;

    let rows = height as usize;
    let cols = width as usize;

    // Read image data
    let result = decoder.read_image()
        .map_err(|e| Error::Other(format!("Cannot read image data: {}", e)))?;

    let data: Vec<T> = match result {
        DecodingResult::F32(buf) => cast_buffer(&buf),
        DecodingResult::F64(buf) => cast_buffer(&buf),
        DecodingResult::U8(buf) => cast_buffer(&buf),
        DecodingResult::U16(buf) => cast_buffer(&buf),
        DecodingResult::U32(buf) => cast_buffer(&buf),
        DecodingResult::U64(buf) => cast_buffer(&buf),
        DecodingResult::I8(buf) => cast_buffer(&buf),
        DecodingResult::I16(buf) => cast_buffer(&buf),
        DecodingResult::I32(buf) => cast_buffer(&buf),
        DecodingResult::I64(buf) => cast_buffer(&buf),
        _ => return Err(Error::UnsupportedDataType("Unsupported TIFF pixel format".to_string())),
    };

    if data.len() != rows * cols {
        return Err(Error::InvalidDimensions {
            width: cols,
            height: rows,
        });
    }

    let mut raster = Raster::from_vec(data, rows, cols)?;

    // Try to read GeoTIFF tags (ModelTiepointTag + ModelPixelScaleTag)
    if let Ok(transform) = read_geotransform(&mut decoder) {
        raster.set_transform(transform);
    }

    // GDAL_NODATA is an ASCII tag holding the printed nodata value
    if let Ok(text) = decoder.get_tag_ascii_string(Tag::Unknown(TAG_GDAL_NODATA)) {
        let trimmed = text.trim_end_matches('\0').trim().to_string();
        if let Ok(value) = trimmed.parse::<f64>() {
            if let Some(nd) = num_traits::cast(value) {
                raster.set_nodata(Some(nd));
            }
        }
    }

    Ok(raster)
}

fn cast_buffer<T: RasterElement, S: NumCast + Copy>(buf: &[S]) -> Vec<T> {
    buf.iter()
        .map(|&v| num_traits::cast(v).unwrap_or(T::default_nodata()))
        .collect()
}

/// Attempt to read GeoTransform from TIFF tags
fn read_geotransform<R: std::io::Read + std::io::Seek>(
    decoder: &mut Decoder<R>,
) -> Result<GeoTransform> {
    let scale = decoder
        .get_tag_f64_vec(Tag::Unknown(TAG_PIXEL_SCALE))
        .map_err(|_| Error::Other("No pixel scale tag".into()))?;

    let tiepoint = decoder
        .get_tag_f64_vec(Tag::Unknown(TAG_TIEPOINT))
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

/// Write a Raster to a GeoTIFF file
pub fn write_geotiff<T, P>(
    raster: &Raster<T>,
    path: P,
    _options: Option<GeoTiffOptions>,
) -> Result<()>
where
    T: RasterElement,
    P: AsRef<Path>,
{
    let file = File::create(path.as_ref())?;
    encode_geotiff(raster, file)
}

/// Write a Raster to an in-memory GeoTIFF buffer
pub fn write_geotiff_to_buffer<T>(
    raster: &Raster<T>,
    _options: Option<GeoTiffOptions>,
) -> Result<Vec<u8>>
where
    T: RasterElement,
{
    let mut buf = Vec::new();
    encode_geotiff(raster, Cursor::new(&mut buf))?;
    Ok(buf)
}

/// Internal: pick the sample format matching the cell type
fn encode_geotiff<T, W>(raster: &Raster<T>, writer: W) -> Result<()>
where
    T: RasterElement,
    W: std::io::Write + std::io::Seek,
{
    use std::mem::size_of;

    if T::is_float() {
        if size_of::<T>() == 8 {
            encode_as::<T, colortype::Gray64Float, W>(raster, writer)
        } else {
            encode_as::<T, colortype::Gray32Float, W>(raster, writer)
        }
    } else {
        match size_of::<T>() {
            1 => encode_as::<T, colortype::Gray8, W>(raster, writer),
            2 => encode_as::<T, colortype::Gray16, W>(raster, writer),
            4 => encode_as::<T, colortype::Gray32, W>(raster, writer),
            _ => encode_as::<T, colortype::Gray64, W>(raster, writer),
        }
    }
}

/// Internal: encode a Raster as single-band GeoTIFF into any `Write + Seek` sink
fn encode_as<T, C, W>(raster: &Raster<T>, writer: W) -> Result<()>
where
    T: RasterElement,
    C: ColorType,
    C::Inner: NumCast + Copy + Zero,
    [C::Inner]: TiffValue,
    W: std::io::Write + std::io::Seek,
{
    let mut encoder = TiffEncoder::new(writer)
        .map_err(|e| Error::Other(format!("TIFF encoder error: {}", e)))?;

    let (rows, cols) = raster.shape();

    let data: Vec<C::Inner> = raster
        .data()
        .iter()
        .map(|&v| num_traits::cast(v).unwrap_or_else(C::Inner::zero))
        .collect();

    let mut image = encoder
        .new_image::<C>(cols as u32, rows as u32)
        .map_err(|e| Error::Other(format!("Cannot create TIFF image: {}", e)))?;

    // Write GeoTIFF tags
    let gt = raster.transform();

    // ModelPixelScaleTag
    let scale = [gt.pixel_width, gt.pixel_height.abs(), 0.0];
    image
        .encoder()
        .write_tag(Tag::Unknown(TAG_PIXEL_SCALE), &scale[..])
        .map_err(|e| Error::Other(format!("Cannot write scale tag: {}", e)))?;

    // ModelTiepointTag
    let tiepoint = [0.0, 0.0, 0.0, gt.origin_x, gt.origin_y, 0.0];
    image
        .encoder()
        .write_tag(Tag::Unknown(TAG_TIEPOINT), &tiepoint[..])
        .map_err(|e| Error::Other(format!("Cannot write tiepoint tag: {}", e)))?;

    // GeoKeyDirectoryTag — minimal entry so external GIS tools recognize
    // this as a valid GeoTIFF. GTModelTypeGeoKey=1 (Projected),
    // GTRasterTypeGeoKey=1 (RasterPixelIsArea).
    let geokeys: Vec<u16> = vec![
        1, 1, 0, 2, // Version 1.1.0, 2 keys
        1024, 0, 1, 1, // GTModelTypeGeoKey = ModelTypeProjected
        1025, 0, 1, 1, // GTRasterTypeGeoKey = RasterPixelIsArea
    ];
    image
        .encoder()
        .write_tag(Tag::Unknown(TAG_GEO_KEYS), geokeys.as_slice())
        .map_err(|e| Error::Other(format!("Cannot write geokey tag: {}", e)))?;

    // GDAL_NODATA
    if let Some(nd) = raster.nodata() {
        let text = match nd.to_f64() {
            Some(v) if v.is_nan() => "nan".to_string(),
            Some(v) => format!("{}", v),
            None => return Err(Error::UnsupportedDataType("nodata not representable".into())),
        };
        image
            .encoder()
            .write_tag(Tag::Unknown(TAG_GDAL_NODATA), text.as_str())
            .map_err(|e| Error::Other(format!("Cannot write nodata tag: {}", e)))?;
    }

    image
        .write_data(&data)
        .map_err(|e| Error::Other(format!("Cannot write image data: {}", e)))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::GeoTransform;

    fn sample_raster() -> Raster<f32> {
        let mut raster: Raster<f32> = Raster::new(8, 6);
        raster.set_transform(GeoTransform::new(500_000.0, 900_000.0, 100.0, -100.0));
        raster.set_nodata(Some(-1.0));
        for row in 0..8 {
            for col in 0..6 {
                raster.set(row, col, (row * 6 + col) as f32).unwrap();
            }
        }
        raster
    }

    #[test]
    fn test_buffer_roundtrip_f32() {
        let raster = sample_raster();
        let buf = write_geotiff_to_buffer(&raster, None).unwrap();
        let loaded: Raster<f32> = read_geotiff_from_buffer(&buf, None).unwrap();

        assert_eq!(loaded.shape(), raster.shape());
        assert_eq!(loaded.get(3, 4).unwrap(), raster.get(3, 4).unwrap());
        assert_eq!(loaded.nodata(), Some(-1.0));
        assert!(loaded.transform().approx_eq(raster.transform(), 1e-9));
    }

    #[test]
    fn test_buffer_roundtrip_u8() {
        let mut raster: Raster<u8> = Raster::new(4, 4);
        raster.set_nodata(Some(255));
        raster.set(1, 2, 7).unwrap();

        let buf = write_geotiff_to_buffer(&raster, None).unwrap();
        let loaded: Raster<u8> = read_geotiff_from_buffer(&buf, None).unwrap();

        assert_eq!(loaded.get(1, 2).unwrap(), 7);
        assert_eq!(loaded.nodata(), Some(255));
    }

    #[test]
    fn test_buffer_roundtrip_f64_nan_nodata() {
        let mut raster: Raster<f64> = Raster::new(3, 3);
        raster.set_nodata(Some(f64::NAN));
        raster.set(0, 0, f64::NAN).unwrap();
        raster.set(2, 2, 123.25).unwrap();

        let buf = write_geotiff_to_buffer(&raster, None).unwrap();
        let loaded: Raster<f64> = read_geotiff_from_buffer(&buf, None).unwrap();

        assert!(loaded.get(0, 0).unwrap().is_nan());
        assert_eq!(loaded.get(2, 2).unwrap(), 123.25);
        assert!(loaded.is_nodata_at(0, 0).unwrap());
    }

    #[test]
    fn test_file_roundtrip() {
        let raster = sample_raster();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("speed.tif");

        write_geotiff(&raster, &path, None).unwrap();
        let loaded: Raster<f32> = read_geotiff(&path, None).unwrap();

        assert_eq!(loaded.shape(), raster.shape());
        assert_eq!(loaded.get(7, 5).unwrap(), raster.get(7, 5).unwrap());
    }
}
