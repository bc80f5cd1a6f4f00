use crate::DIMENSION;
use crate::geometry::{Point, Region, Shape, ShapeType};
use crate::{Error, Result};

/// Closed vertex loop. Indexed by its bounds only; the spatial predicates are
/// conservative constants, so exact-face filtering is left to the caller.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Face {
    vertices: Vec<Point>,
}

impl Face {
    pub fn new(vertices: Vec<Point>) -> Self {
        Self { vertices }
    }

    pub fn vertices(&self) -> &[Point] {
        &self.vertices
    }

    pub fn decode(data: &[u8]) -> Result<Self> {
        if data.len() < 4 {
            return Err(Error::EndOfStream("face record"));
        }
        let count = u32::from_le_bytes(data[..4].try_into().unwrap()) as usize;
        let body = &data[4..];
        if body.len() < count * DIMENSION * 8 {
            return Err(Error::EndOfStream("face record"));
        }
        let mut vertices = Vec::with_capacity(count);
        for i in 0..count {
            vertices.push(Point::decode(&body[i * DIMENSION * 8..])?);
        }
        Ok(Self { vertices })
    }
}

impl Shape for Face {
    fn shape_type(&self) -> ShapeType {
        ShapeType::Face
    }

    fn mbr(&self) -> Region {
        let mut mbr = Region::infinite();
        for v in &self.vertices {
            mbr.combine_point(v);
        }
        mbr
    }

    fn center(&self) -> Point {
        if self.vertices.is_empty() {
            return Point::default();
        }
        let mut coords = [0.0; DIMENSION];
        for v in &self.vertices {
            for (acc, c) in coords.iter_mut().zip(v.coords()) {
                *acc += c;
            }
        }
        for c in &mut coords {
            *c /= self.vertices.len() as f64;
        }
        Point::new(coords)
    }

    fn area(&self) -> f64 {
        0.0
    }

    fn intersects_region(&self, _r: &Region) -> bool {
        false
    }

    fn contains_region(&self, _r: &Region) -> bool {
        false
    }

    fn touches_region(&self, _r: &Region) -> bool {
        false
    }

    fn min_distance_to_region(&self, _r: &Region) -> f64 {
        f64::MAX
    }

    fn encoded_len(&self) -> usize {
        4 + self.vertices.len() * DIMENSION * 8
    }

    fn encode_to(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&(self.vertices.len() as u32).to_le_bytes());
        for v in &self.vertices {
            v.encode_to(out);
        }
    }
}
