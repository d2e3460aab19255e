use crate::{
    math::TileIndex,
    result::TileResult,
    source::{RasterCache, TileSourceConfig},
};
use bevy::log::{debug, warn};
use image::RgbaImage;
use reqwest::blocking::Client;

/// The decoded raster of a tile.
#[derive(Clone, Debug)]
pub struct TileImage {
    pub tile: TileIndex,
    pub image: RgbaImage,
}

#[derive(Clone, Debug)]
pub enum TileFetch {
    Image(TileImage),
    /// The source has no usable raster for the tile.
    Unavailable,
}

impl TileFetch {
    pub fn image(self) -> Option<TileImage> {
        match self {
            TileFetch::Image(image) => Some(image),
            TileFetch::Unavailable => None,
        }
    }
}

/// Provides the raster of tiles.
pub trait TileFetcher {
    fn fetch(&self, tile: TileIndex) -> TileResult<TileFetch>;
}

/// Downloads tiles from the url template of a [`TileSourceConfig`], going through a [`RasterCache`].
///
/// Only successful downloads are cached, unavailable tiles are requested again next time.
pub struct HttpTileFetcher<C: RasterCache> {
    config: TileSourceConfig,
    cache: C,
    client: Client,
}

impl<C: RasterCache> HttpTileFetcher<C> {
    pub fn new(config: TileSourceConfig, cache: C) -> TileResult<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()?;

        Ok(Self {
            config,
            cache,
            client,
        })
    }

    pub fn config(&self) -> &TileSourceConfig {
        &self.config
    }

    pub fn cache(&self) -> &C {
        &self.cache
    }

    fn download(&self, url: &str) -> Option<Vec<u8>> {
        let response = match self.client.get(url).send() {
            Ok(response) => response,
            Err(error) => {
                warn!("Failed to request {url}: {error}");
                return None;
            }
        };

        if !response.status().is_success() {
            warn!("Requesting {url} failed with status {}.", response.status());
            return None;
        }

        match response.bytes() {
            Ok(bytes) => Some(bytes.to_vec()),
            Err(error) => {
                warn!("Failed to read the response of {url}: {error}");
                None
            }
        }
    }

    fn decode(&self, tile: TileIndex, bytes: &[u8]) -> Option<TileImage> {
        let image = match image::load_from_memory(bytes) {
            Ok(image) => image.to_rgba8(),
            Err(error) => {
                warn!("Failed to decode tile {tile}: {error}");
                return None;
            }
        };

        let size = self.config.tile_size;

        if image.dimensions() != (size, size) {
            warn!(
                "Tile {tile} has a size of {:?}, expected {size}x{size}.",
                image.dimensions()
            );
            return None;
        }

        Some(TileImage { tile, image })
    }
}

impl<C: RasterCache> TileFetcher for HttpTileFetcher<C> {
    fn fetch(&self, tile: TileIndex) -> TileResult<TileFetch> {
        let url = tile.validate()?.url(&self.config.url);

        let _lock = self.cache.lock(&url)?;

        let bytes = match self.cache.get(&url)? {
            Some(bytes) => bytes,
            None => {
                debug!("Downloading tile {tile} from {url}.");

                let Some(bytes) = self.download(&url) else {
                    return Ok(TileFetch::Unavailable);
                };

                self.cache.put(&url, &bytes)?;
                bytes
            }
        };

        Ok(self
            .decode(tile, &bytes)
            .map_or(TileFetch::Unavailable, TileFetch::Image))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        result::TileError,
        source::{DiskCache, DiskCacheConfig},
    };
    use image::{ImageFormat, Rgba};
    use std::io::Cursor;
    use tempfile::{tempdir, TempDir};

    fn fetcher(tile_size: u32) -> (TempDir, HttpTileFetcher<DiskCache>) {
        let dir = tempdir().unwrap();

        let config = TileSourceConfig {
            // Nothing listens on the discard port, so requests fail right away.
            url: "http://127.0.0.1:9/{zoom}/{x}/{y}.png".to_string(),
            tile_size,
            request_timeout_secs: 5,
            ..Default::default()
        };
        let cache = DiskCache::open(DiskCacheConfig::new(dir.path())).unwrap();

        (dir, HttpTileFetcher::new(config, cache).unwrap())
    }

    fn png(size: u32) -> Vec<u8> {
        let image = RgbaImage::from_pixel(size, size, Rgba([10, 20, 30, 255]));
        let mut bytes = Cursor::new(Vec::new());
        image.write_to(&mut bytes, ImageFormat::Png).unwrap();

        bytes.into_inner()
    }

    #[test]
    fn cached_tile_is_decoded() {
        let (_dir, fetcher) = fetcher(16);
        let tile = TileIndex::new(3, 4, 2);

        fetcher
            .cache()
            .put(&tile.url(&fetcher.config().url), &png(16))
            .unwrap();

        let image = fetcher.fetch(tile).unwrap().image().unwrap();
        assert_eq!(image.tile, tile);
        assert_eq!(image.image.dimensions(), (16, 16));
        assert_eq!(image.image.get_pixel(3, 7), &Rgba([10, 20, 30, 255]));
    }

    #[test]
    fn wrong_size_is_unavailable() {
        let (_dir, fetcher) = fetcher(256);
        let tile = TileIndex::new(1, 0, 1);

        fetcher
            .cache()
            .put(&tile.url(&fetcher.config().url), &png(16))
            .unwrap();

        assert!(matches!(fetcher.fetch(tile), Ok(TileFetch::Unavailable)));
    }

    #[test]
    fn corrupt_tile_is_unavailable() {
        let (_dir, fetcher) = fetcher(256);
        let tile = TileIndex::ROOT;

        fetcher
            .cache()
            .put(&tile.url(&fetcher.config().url), b"not an image")
            .unwrap();

        assert!(matches!(fetcher.fetch(tile), Ok(TileFetch::Unavailable)));
    }

    #[test]
    fn unreachable_source_is_unavailable() {
        let (_dir, fetcher) = fetcher(256);
        let tile = TileIndex::new(2, 1, 1);

        assert!(matches!(fetcher.fetch(tile), Ok(TileFetch::Unavailable)));

        // Failures are not cached.
        let url = tile.url(&fetcher.config().url);
        assert_eq!(fetcher.cache().get(&url).unwrap(), None);
    }

    #[test]
    fn invalid_tile_is_rejected() {
        let (_dir, fetcher) = fetcher(256);

        assert!(matches!(
            fetcher.fetch(TileIndex::INVALID),
            Err(TileError::InvalidTileIndex(_))
        ));
    }
}
