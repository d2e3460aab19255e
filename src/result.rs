use crate::math::TileIndex;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TileError {
    #[error("{0} not initialized, tessellate a tile set first")]
    UninitializedState(&'static str),
    #[error("tile {tile} resolves to {points} boundary points, at least 3 are required")]
    DegenerateGeometry { tile: TileIndex, points: usize },
    #[error("invalid tile index {0}")]
    InvalidTileIndex(TileIndex),
    #[error("timed out waiting for the cache lock of {0}")]
    LockTimeout(String),
    #[error("IO error")]
    Io(#[from] std::io::Error),
    #[error("HTTP error")]
    Http(#[from] reqwest::Error),
    #[error("Image error")]
    Image(#[from] image::ImageError),
}

pub type TileResult<T> = Result<T, TileError>;
