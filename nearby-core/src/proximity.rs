//! Proximity evaluation - filter a peer snapshot down to peers in radius.

use nearby_types::{Identity, LocationFix, NearbySet, PeerLocation, ProximityEvent};

use crate::geo::distance_meters;

/// Evaluate which peers are within `radius_meters` of the local fix.
///
/// Pure function. Peers with no identity and the local participant itself
/// are excluded. A peer is included iff its great-circle distance from the
/// fix is `<= radius_meters`; a radius of 0 therefore matches only exact
/// coordinate equality.
///
/// Output order is input order (stable filter, no re-sorting by distance).
/// This keeps the result deterministic for a given store snapshot; callers
/// that want distance ordering can sort the returned set themselves.
pub fn evaluate(
    self_identity: &Identity,
    self_fix: &LocationFix,
    peers: &[PeerLocation],
    radius_meters: f64,
) -> NearbySet {
    let events = peers
        .iter()
        .filter_map(|peer| {
            let identity = peer.identity.as_ref()?;
            if identity == self_identity {
                return None;
            }

            let distance = distance_meters(
                self_fix.latitude,
                self_fix.longitude,
                peer.latitude,
                peer.longitude,
            );
            (distance <= radius_meters).then(|| ProximityEvent {
                identity: identity.clone(),
                distance_meters: distance,
            })
        })
        .collect();

    NearbySet::from_events(events)
}
