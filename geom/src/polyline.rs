use crate::{Coordinate, Distance, LonLat};

/// Total great-circle length of a chain of coordinates.
pub fn haversine_length(coordinates: &[Coordinate]) -> Distance {
    coordinates
        .windows(2)
        .map(|pair| pair[0].to_lon_lat().gps_dist(pair[1].to_lon_lat()))
        .sum()
}

/// The point `fraction` of the way along the segment from `a` to `b`.
/// Linear in lon/lat space, which is plenty for the segment lengths roads
/// are digitized with.
pub fn interpolate(a: LonLat, b: LonLat, fraction: f64) -> LonLat {
    LonLat::new(
        a.longitude + fraction * (b.longitude - a.longitude),
        a.latitude + fraction * (b.latitude - a.latitude),
    )
}

/// The prefix of `coordinates` that is `desired_length` long, with the final
/// coordinate interpolated onto the cutting segment. If the polyline is too
/// short, returns all of it.
pub fn trim_to_length(coordinates: &[Coordinate], desired_length: Distance) -> Vec<Coordinate> {
    assert!(coordinates.len() >= 2);

    let mut result = vec![coordinates[0]];
    let mut accumulated = Distance::ZERO;
    for pair in coordinates.windows(2) {
        let (from, to) = (pair[0].to_lon_lat(), pair[1].to_lon_lat());
        let segment = from.gps_dist(to);
        if segment > Distance::ZERO && accumulated + segment >= desired_length {
            let fraction = (desired_length - accumulated) / segment;
            result.push(interpolate(from, to, fraction).to_fixed());
            return result;
        }
        accumulated += segment;
        result.push(pair[1]);
    }
    result
}

/// Fits a line through the coordinates by least squares, treating longitude
/// as x and latitude as y, and returns two points on it: one just west of
/// the input's extent, one just east. The fitted line is a stable estimate
/// of the overall direction that shrugs off drafting wobbles at either end.
///
/// When all points share one meridian the slope is undefined; the first and
/// last input coordinates come back unchanged.
pub fn least_squares_regression(coordinates: &[Coordinate]) -> (LonLat, LonLat) {
    assert!(coordinates.len() >= 2);

    let n = coordinates.len() as f64;
    let mut sum_lon = 0.0;
    let mut sum_lat = 0.0;
    let mut sum_lon_lat = 0.0;
    let mut sum_lon_lon = 0.0;
    let mut min_lon = coordinates[0].to_lon_lat().longitude;
    let mut max_lon = min_lon;
    for coordinate in coordinates {
        let ll = coordinate.to_lon_lat();
        min_lon = min_lon.min(ll.longitude);
        max_lon = max_lon.max(ll.longitude);
        sum_lon += ll.longitude;
        sum_lon_lon += ll.longitude * ll.longitude;
        sum_lat += ll.latitude;
        sum_lon_lat += ll.longitude * ll.latitude;
    }

    let dividend = n * sum_lon_lat - sum_lon * sum_lat;
    let divisor = n * sum_lon_lon - sum_lon * sum_lon;
    if divisor.abs() < f64::EPSILON {
        return (
            coordinates[0].to_lon_lat(),
            coordinates.last().unwrap().to_lon_lat(),
        );
    }

    let slope = dividend / divisor;
    let intercept = (sum_lat - slope * sum_lon) / n;
    let lat_at = |lon: f64| intercept + slope * lon;

    (
        LonLat::new(min_lon - 1.0, lat_at(min_lon - 1.0)),
        LonLat::new(max_lon + 1.0, lat_at(max_lon + 1.0)),
    )
}

/// The closest point to `p` on the infinite line through `a` and `b`.
/// Degenerate lines (`a` and `b` coincident) return `a`.
pub fn closest_point_on_line(a: LonLat, b: LonLat, p: LonLat) -> LonLat {
    let dx = b.longitude - a.longitude;
    let dy = b.latitude - a.latitude;
    let len_squared = dx * dx + dy * dy;
    if len_squared < f64::EPSILON {
        return a;
    }
    let t = ((p.longitude - a.longitude) * dx + (p.latitude - a.latitude) * dy) / len_squared;
    LonLat::new(a.longitude + t * dx, a.latitude + t * dy)
}
