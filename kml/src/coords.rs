use anyhow::{bail, Context, Result};

use crate::Coordinate;

/// Parses one KML coordinate tuple, `lon,lat` or `lon,lat,elevation`.
pub fn parse_kml_tuple(token: &str) -> Result<Coordinate> {
    let parts: Vec<&str> = token.trim().split(',').collect();
    if parts.len() != 2 && parts.len() != 3 {
        bail!("Malformed coordinates: {}", token);
    }
    let mut values = Vec::new();
    for part in parts {
        values.push(
            part.trim()
                .parse::<f64>()
                .with_context(|| format!("Malformed coordinates: {}", token))?,
        );
    }
    Ok(tuple_to_coordinate(&values))
}

fn tuple_to_coordinate(values: &[f64]) -> Coordinate {
    Coordinate {
        lon: values[0],
        lat: values[1],
        elevation: values.get(2).copied(),
    }
}

/// The textual form stored in the CSV `Coordinates` column: a list of tuples, like
/// `[(-4.317, 55.9424, 55.0), (-4.3201, 55.951)]`. Every float is written with the shortest
/// representation that parses back to the same value.
pub fn format_coordinates(coordinates: &[Coordinate]) -> String {
    let mut out = String::from("[");
    for (idx, c) in coordinates.iter().enumerate() {
        if idx != 0 {
            out.push_str(", ");
        }
        out.push_str(&match c.elevation {
            Some(elevation) => format!("({:?}, {:?}, {:?})", c.lon, c.lat, elevation),
            None => format!("({:?}, {:?})", c.lon, c.lat),
        });
    }
    out.push(']');
    out
}

/// The inverse of `format_coordinates`.
pub fn parse_coordinates(raw: &str) -> Result<Vec<Coordinate>> {
    let trimmed = raw.trim();
    let inner = match trimmed
        .strip_prefix('[')
        .and_then(|x| x.strip_suffix(']'))
    {
        Some(inner) => inner,
        None => bail!("Coordinates {} aren't a bracketed list", raw),
    };

    let mut result = Vec::new();
    let mut rest = inner.trim();
    while !rest.is_empty() {
        let rest_of_tuple = match rest.strip_prefix('(') {
            Some(x) => x,
            None => bail!("Expected a tuple at \"{}\"", rest),
        };
        let close = match rest_of_tuple.find(')') {
            Some(idx) => idx,
            None => bail!("Unclosed tuple at \"{}\"", rest),
        };

        let mut values = Vec::new();
        for part in rest_of_tuple[..close].split(',') {
            let part = part.trim();
            // Python writes single-element tuples with a trailing comma
            if part.is_empty() {
                continue;
            }
            values.push(
                part.parse::<f64>()
                    .with_context(|| format!("Bad number {} in {}", part, raw))?,
            );
        }
        if values.len() != 2 && values.len() != 3 {
            bail!(
                "Tuple ({}) needs 2 or 3 numbers",
                &rest_of_tuple[..close]
            );
        }
        result.push(tuple_to_coordinate(&values));

        rest = rest_of_tuple[close + 1..].trim_start();
        if let Some(x) = rest.strip_prefix(',') {
            rest = x.trim_start();
        } else if !rest.is_empty() {
            bail!("Expected a comma at \"{}\"", rest);
        }
    }
    Ok(result)
}
