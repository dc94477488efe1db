use anyhow::{bail, Context, Result};
use geojson::JsonObject;

use geom::{Crs, LonLat};
use maputil::{prettyprint_usize, Tags, Timer};

use crate::{Feature, FeatureCollection, OsmQuery};

/// Saves features as a GeoJSON FeatureCollection. Tags become string properties.
pub fn write_geojson(path: &str, collection: &FeatureCollection) -> Result<()> {
    if collection.crs != Crs::Wgs84 {
        bail!(
            "GeoJSON is always WGS84, but this collection is in {}",
            collection.crs
        );
    }
    let mut features = Vec::new();
    for f in &collection.features {
        let mut properties = JsonObject::new();
        for (k, v) in f.tags.inner() {
            properties.insert(k.clone(), v.clone().into());
        }
        features.push(geojson::Feature {
            bbox: None,
            geometry: Some(geojson::Geometry::new(geojson::Value::from(&f.geometry))),
            id: None,
            properties: Some(properties),
            foreign_members: None,
        });
    }
    let fc = geojson::FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    };
    mapio::write_file(path, &serde_json::to_vec(&fc)?)?;
    info!(
        "Wrote {} features to {}",
        prettyprint_usize(collection.len()),
        path
    );
    Ok(())
}

/// The inverse of `write_geojson`. Features without geometry are skipped; non-string properties
/// are kept as their JSON text.
pub fn read_geojson(path: &str) -> Result<FeatureCollection> {
    let fc: geojson::FeatureCollection = mapio::read_json(path)?;
    let mut collection = FeatureCollection::new(Crs::Wgs84);
    for feature in fc.features {
        let geometry = match feature.geometry {
            Some(g) => geo::Geometry::<f64>::try_from(g)
                .with_context(|| format!("bad geometry in {}", path))?,
            None => continue,
        };
        let tags: Tags = feature
            .properties
            .unwrap_or_default()
            .into_iter()
            .map(|(k, v)| match v {
                serde_json::Value::String(s) => (k, s),
                other => (k, other.to_string()),
            })
            .collect();
        collection.features.push(Feature::new(geometry, tags));
    }
    Ok(collection)
}

/// Reads the layer from `path` if it's there. Otherwise runs the query around `center` and saves
/// the result to `path` before returning it, so the next run doesn't hit the network.
pub async fn load_or_fetch(
    path: &str,
    query: &OsmQuery,
    center: LonLat,
    timer: &mut Timer,
) -> Result<FeatureCollection> {
    if mapio::file_exists(path) {
        timer.start(format!("load {}", path));
        let collection = read_geojson(path)?;
        timer.stop(format!("load {}", path));
        timer.note(format!(
            "Loaded {} cached features from {}",
            prettyprint_usize(collection.len()),
            path
        ));
        return Ok(collection);
    }

    timer.note(format!("No cache at {}, querying Overpass around {}", path, center));
    let collection = query.fetch(center, timer).await?;
    write_geojson(path, &collection)?;
    Ok(collection)
}
