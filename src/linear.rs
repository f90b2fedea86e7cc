//! Planar linear referencing.
//!
//! Everything the segmentation model needs from a spatial backend:
//! - Length and cumulative length of polylines
//! - Locating a coordinate as a fraction along a line, and the reverse
//! - Sub-line extraction, splitting and concatenation
//! - Lateral offsets (points and parallel curves)
//! - Line/line intersections
//! - Topology-preserving simplification
//!
//! All measurements are Euclidean; coordinates are expected in a projected
//! metric CRS.

use geo::algorithm::line_intersection::{line_intersection, LineIntersection};
use geo::algorithm::simplify_vw::SimplifyVwPreserve;
use geo::{Coord, Line, LineString};

/// Distance below which two coordinates are treated as the same vertex
/// when concatenating parts.
const JUNCTION_EPSILON: f64 = 1e-9;
/// Fraction of the line length within which a location counts as a vertex.
const VERTEX_EPSILON: f64 = 1e-9;

/// Result of projecting a coordinate onto a line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocatedPoint {
    /// Closest coordinate on the line
    pub coord: Coord<f64>,
    /// Fraction of the line length at the closest coordinate (0.0-1.0)
    pub fraction: f64,
    /// Distance from the input coordinate to the line
    pub distance: f64,
    /// +1.0 when the input lies left of the line direction, -1.0 right, 0.0 on it
    pub side: f64,
}

impl LocatedPoint {
    /// Distance signed by side (left positive).
    pub fn signed_distance(&self) -> f64 {
        self.distance * self.side
    }
}

/// An intersection between two lines, with its position along each.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Intersection {
    pub coord: Coord<f64>,
    pub fraction_a: f64,
    pub fraction_b: f64,
}

/// Euclidean distance between two coordinates.
#[inline]
pub fn distance(a: Coord<f64>, b: Coord<f64>) -> f64 {
    (a.x - b.x).hypot(a.y - b.y)
}

/// Check whether two coordinates are within `tolerance` of each other.
#[inline]
pub fn coords_close(a: Coord<f64>, b: Coord<f64>, tolerance: f64) -> bool {
    distance(a, b) <= tolerance
}

/// Planar length of a line.
pub fn line_length(line: &LineString<f64>) -> f64 {
    line.lines().map(|l| distance(l.start, l.end)).sum()
}

/// Cumulative length at each vertex. The first entry is always 0.
pub fn cumulative_lengths(line: &LineString<f64>) -> Vec<f64> {
    let mut out = Vec::with_capacity(line.0.len());
    let mut acc = 0.0;
    for (i, c) in line.0.iter().enumerate() {
        if i > 0 {
            acc += distance(line.0[i - 1], *c);
        }
        out.push(acc);
    }
    out
}

/// Coordinate at `target` metres along the line, given cumulative lengths.
fn coord_at_distance(coords: &[Coord<f64>], cumulative: &[f64], target: f64) -> Coord<f64> {
    if coords.is_empty() {
        return Coord { x: 0.0, y: 0.0 };
    }
    if target <= 0.0 {
        return coords[0];
    }
    for i in 1..coords.len() {
        if cumulative[i] >= target {
            let seg_len = cumulative[i] - cumulative[i - 1];
            if seg_len <= 0.0 {
                return coords[i];
            }
            let t = (target - cumulative[i - 1]) / seg_len;
            let a = coords[i - 1];
            let b = coords[i];
            return Coord {
                x: a.x + (b.x - a.x) * t,
                y: a.y + (b.y - a.y) * t,
            };
        }
    }
    coords[coords.len() - 1]
}

/// Coordinate at `fraction` of the line length. The fraction is clamped to [0, 1].
pub fn interpolate_point(line: &LineString<f64>, fraction: f64) -> Coord<f64> {
    let cumulative = cumulative_lengths(line);
    let total = cumulative.last().copied().unwrap_or(0.0);
    coord_at_distance(&line.0, &cumulative, fraction.clamp(0.0, 1.0) * total)
}

/// Project a coordinate onto the closest point of a line.
///
/// Ties between equally close segments resolve to the earliest one, so a
/// coordinate sitting on a vertex reports the smaller fraction.
pub fn closest_point(line: &LineString<f64>, coord: Coord<f64>) -> LocatedPoint {
    let cumulative = cumulative_lengths(line);
    let total = cumulative.last().copied().unwrap_or(0.0);

    let mut best = LocatedPoint {
        coord: line.0.first().copied().unwrap_or(coord),
        fraction: 0.0,
        distance: line.0.first().map_or(0.0, |c| distance(*c, coord)),
        side: 0.0,
    };

    for (i, seg) in line.lines().enumerate() {
        let dx = seg.end.x - seg.start.x;
        let dy = seg.end.y - seg.start.y;
        let len_sq = dx * dx + dy * dy;
        let t = if len_sq > 0.0 {
            (((coord.x - seg.start.x) * dx + (coord.y - seg.start.y) * dy) / len_sq).clamp(0.0, 1.0)
        } else {
            0.0
        };
        let proj = Coord {
            x: seg.start.x + dx * t,
            y: seg.start.y + dy * t,
        };
        let d = distance(proj, coord);
        if i == 0 || d < best.distance {
            let cross = dx * (coord.y - seg.start.y) - dy * (coord.x - seg.start.x);
            let side = if d <= JUNCTION_EPSILON {
                0.0
            } else if cross > 0.0 {
                1.0
            } else if cross < 0.0 {
                -1.0
            } else {
                0.0
            };
            let along = cumulative[i] + len_sq.sqrt() * t;
            best = LocatedPoint {
                coord: proj,
                fraction: if total > 0.0 { (along / total).clamp(0.0, 1.0) } else { 0.0 },
                distance: d,
                side,
            };
        }
    }

    best
}

/// Fraction of the line length at the point closest to `coord`.
pub fn locate_point(line: &LineString<f64>, coord: Coord<f64>) -> f64 {
    closest_point(line, coord).fraction
}

/// Reverse the vertex order of a line.
pub fn reverse_line(line: &LineString<f64>) -> LineString<f64> {
    let mut coords = line.0.clone();
    coords.reverse();
    LineString::new(coords)
}

/// Extract the part of a line between two fractions.
///
/// When `start > end` the extracted part is reversed, following the
/// direction of travel. A degenerate range yields a two-vertex line of
/// zero length at that position.
pub fn line_substring(line: &LineString<f64>, start: f64, end: f64) -> LineString<f64> {
    if start > end {
        return reverse_line(&line_substring(line, end, start));
    }

    let cumulative = cumulative_lengths(line);
    let total = cumulative.last().copied().unwrap_or(0.0);
    let start_d = start.clamp(0.0, 1.0) * total;
    let end_d = end.clamp(0.0, 1.0) * total;

    let first = coord_at_distance(&line.0, &cumulative, start_d);
    let last = coord_at_distance(&line.0, &cumulative, end_d);

    let mut coords = vec![first];
    if line.0.len() > 2 {
        for i in 1..line.0.len() - 1 {
            if cumulative[i] > start_d && cumulative[i] < end_d {
                coords.push(line.0[i]);
            }
        }
    }
    coords.push(last);
    LineString::new(coords)
}

/// Split a line in two at a fraction.
pub fn split_line(line: &LineString<f64>, fraction: f64) -> (LineString<f64>, LineString<f64>) {
    (
        line_substring(line, 0.0, fraction),
        line_substring(line, fraction, 1.0),
    )
}

/// Join consecutive parts, dropping the duplicated vertex at each junction.
pub fn concat_lines(parts: &[LineString<f64>]) -> LineString<f64> {
    let mut coords: Vec<Coord<f64>> = Vec::new();
    for part in parts {
        for c in &part.0 {
            match coords.last() {
                Some(last) if coords_close(*last, *c, JUNCTION_EPSILON) => {}
                _ => coords.push(*c),
            }
        }
    }
    if coords.len() == 1 {
        coords.push(coords[0]);
    }
    LineString::new(coords)
}

/// Unit directions of travel arriving at and leaving a fraction of the line.
///
/// Inside a segment both are that segment's direction. At an interior vertex
/// they are the directions of the segments before and after it. Nothing
/// arrives at the start of the line and nothing leaves its end. Zero-length
/// segments are skipped.
pub fn travel_directions_at(
    line: &LineString<f64>,
    fraction: f64,
) -> (Option<Coord<f64>>, Option<Coord<f64>>) {
    let cumulative = cumulative_lengths(line);
    let total = cumulative.last().copied().unwrap_or(0.0);
    if total <= 0.0 {
        return (None, None);
    }
    let target = fraction.clamp(0.0, 1.0) * total;
    let tolerance = VERTEX_EPSILON * total;

    let segments: Vec<(f64, f64, Coord<f64>)> = line
        .lines()
        .enumerate()
        .filter_map(|(i, seg)| {
            let len = distance(seg.start, seg.end);
            (len > 0.0).then(|| {
                let dir = Coord {
                    x: (seg.end.x - seg.start.x) / len,
                    y: (seg.end.y - seg.start.y) / len,
                };
                (cumulative[i], cumulative[i + 1], dir)
            })
        })
        .collect();

    let incoming = segments
        .iter()
        .rev()
        .find(|(from, _, _)| *from < target - tolerance)
        .map(|(_, _, dir)| *dir);
    let outgoing = segments
        .iter()
        .find(|(_, to, _)| *to > target + tolerance)
        .map(|(_, _, dir)| *dir);
    (incoming, outgoing)
}

/// Direction that sideways offsets are measured from, given the directions
/// of travel arriving at and leaving a location.
///
/// At a corner this is the unit bisector of both, so the offset side does
/// not depend on which of the two segments the location is attached to.
/// A full U-turn keeps the arriving direction.
pub fn bisect_directions(incoming: Option<Coord<f64>>, outgoing: Option<Coord<f64>>) -> Coord<f64> {
    match (incoming, outgoing) {
        (Some(a), Some(b)) => {
            let sum = a + b;
            let len = sum.x.hypot(sum.y);
            if len > JUNCTION_EPSILON {
                sum / len
            } else {
                a
            }
        }
        (Some(a), None) | (None, Some(a)) => a,
        (None, None) => Coord { x: 0.0, y: 0.0 },
    }
}

/// Unit tangent of the line at a fraction.
///
/// At an interior vertex this bisects the segments meeting there. At either
/// end of the line the end segment is used. Returns (0, 0) for a degenerate line.
pub fn direction_at(line: &LineString<f64>, fraction: f64) -> Coord<f64> {
    let (incoming, outgoing) = travel_directions_at(line, fraction);
    bisect_directions(incoming, outgoing)
}

/// Move a coordinate sideways from a direction (left of travel is positive).
pub fn offset_point(coord: Coord<f64>, direction: Coord<f64>, offset: f64) -> Coord<f64> {
    Coord {
        x: coord.x - direction.y * offset,
        y: coord.y + direction.x * offset,
    }
}

/// Parallel curve at a signed lateral distance (left positive).
///
/// Vertices use a mitre join; when the mitre would exceed `mitre_limit`
/// times the offset, the corner is bevelled instead.
pub fn offset_curve(line: &LineString<f64>, offset: f64, mitre_limit: f64) -> LineString<f64> {
    if offset == 0.0 {
        return line.clone();
    }

    let mut coords: Vec<Coord<f64>> = Vec::with_capacity(line.0.len());
    for c in &line.0 {
        match coords.last() {
            Some(last) if coords_close(*last, *c, JUNCTION_EPSILON) => {}
            _ => coords.push(*c),
        }
    }
    if coords.len() < 2 {
        return line.clone();
    }

    let normals: Vec<Coord<f64>> = coords
        .windows(2)
        .map(|w| {
            let len = distance(w[0], w[1]);
            Coord {
                x: -(w[1].y - w[0].y) / len,
                y: (w[1].x - w[0].x) / len,
            }
        })
        .collect();

    let mut out = Vec::with_capacity(coords.len() + 4);
    out.push(coords[0] + normals[0] * offset);

    for i in 1..coords.len() - 1 {
        let n_prev = normals[i - 1];
        let n_next = normals[i];
        let sum = n_prev + n_next;
        let sum_len = sum.x.hypot(sum.y);
        let c = coords[i];

        if sum_len < 1e-12 {
            out.push(c + n_prev * offset);
            out.push(c + n_next * offset);
            continue;
        }

        let mitre = sum / sum_len;
        let cos_half = mitre.x * n_next.x + mitre.y * n_next.y;
        let scale = offset / cos_half;
        if scale.abs() > mitre_limit * offset.abs() {
            out.push(c + n_prev * offset);
            out.push(c + n_next * offset);
        } else {
            out.push(c + mitre * scale);
        }
    }

    let last = coords.len() - 1;
    out.push(coords[last] + normals[last - 1] * offset);
    LineString::new(out)
}

/// All intersections between two lines, ordered along `a`.
///
/// Collinear overlaps contribute both ends of the shared stretch.
pub fn line_intersections(a: &LineString<f64>, b: &LineString<f64>) -> Vec<Intersection> {
    let cum_a = cumulative_lengths(a);
    let cum_b = cumulative_lengths(b);
    let total_a = cum_a.last().copied().unwrap_or(0.0);
    let total_b = cum_b.last().copied().unwrap_or(0.0);
    if total_a <= 0.0 || total_b <= 0.0 {
        return Vec::new();
    }

    let fraction_on = |cum: &[f64], total: f64, i: usize, start: Coord<f64>, c: Coord<f64>| {
        ((cum[i] + distance(start, c)) / total).clamp(0.0, 1.0)
    };

    let mut found = Vec::new();
    for (i, seg_a) in a.lines().enumerate() {
        for (j, seg_b) in b.lines().enumerate() {
            if !segment_boxes_touch(&seg_a, &seg_b) {
                continue;
            }
            let hits: Vec<Coord<f64>> = match line_intersection(seg_a, seg_b) {
                Some(LineIntersection::SinglePoint { intersection, .. }) => vec![intersection],
                Some(LineIntersection::Collinear { intersection }) => {
                    vec![intersection.start, intersection.end]
                }
                None => continue,
            };
            for coord in hits {
                found.push(Intersection {
                    coord,
                    fraction_a: fraction_on(&cum_a, total_a, i, seg_a.start, coord),
                    fraction_b: fraction_on(&cum_b, total_b, j, seg_b.start, coord),
                });
            }
        }
    }

    found.sort_by(|x, y| x.fraction_a.total_cmp(&y.fraction_a));
    found.dedup_by(|x, y| {
        coords_close(x.coord, y.coord, JUNCTION_EPSILON)
            && (x.fraction_b - y.fraction_b).abs() <= JUNCTION_EPSILON
    });
    found
}

fn segment_boxes_touch(a: &Line<f64>, b: &Line<f64>) -> bool {
    a.start.x.min(a.end.x) <= b.start.x.max(b.end.x)
        && b.start.x.min(b.end.x) <= a.start.x.max(a.end.x)
        && a.start.y.min(a.end.y) <= b.start.y.max(b.end.y)
        && b.start.y.min(b.end.y) <= a.start.y.max(a.end.y)
}

/// Topology-preserving simplification with a distance tolerance.
///
/// Uses Visvalingam-Whyatt with an area threshold of `tolerance²` and the
/// self-intersection check. Never returns fewer than the two end vertices.
pub fn simplify_preserve_topology(line: &LineString<f64>, tolerance: f64) -> LineString<f64> {
    if line.0.len() <= 2 || tolerance <= 0.0 {
        return line.clone();
    }
    let simplified = line.simplify_vw_preserve(&(tolerance * tolerance));
    if simplified.0.len() < 2 {
        LineString::new(vec![line.0[0], line.0[line.0.len() - 1]])
    } else {
        simplified
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn l_shape() -> LineString<f64> {
        LineString::from(vec![(0.0, 0.0), (10.0, 0.0), (10.0, 10.0)])
    }

    #[test]
    fn test_substring_spans_vertex() {
        let sub = line_substring(&l_shape(), 0.25, 0.75);
        assert_eq!(
            sub.0,
            vec![
                Coord { x: 5.0, y: 0.0 },
                Coord { x: 10.0, y: 0.0 },
                Coord { x: 10.0, y: 5.0 }
            ]
        );
    }

    #[test]
    fn test_closest_point_side() {
        let line = LineString::from(vec![(0.0, 0.0), (10.0, 0.0)]);
        let left = closest_point(&line, Coord { x: 4.0, y: 2.0 });
        let right = closest_point(&line, Coord { x: 4.0, y: -2.0 });
        assert_eq!(left.side, 1.0);
        assert_eq!(right.side, -1.0);
        assert!((left.fraction - 0.4).abs() < 1e-12);
    }
}
