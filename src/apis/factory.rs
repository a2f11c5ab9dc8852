use crate::apis::base::VenueExtractor;
use crate::apis::bottom_lounge::BottomLoungeExtractor;
use crate::apis::double_door::DoubleDoorExtractor;
use crate::apis::empty_bottle::EmptyBottleExtractor;
use crate::apis::house_of_blues::HouseOfBluesExtractor;
use crate::apis::lh_st::LhStExtractor;
use crate::apis::metro::MetroExtractor;
use crate::apis::subterranean::SubterraneanExtractor;
use crate::apis::thalia_hall::ThaliaHallExtractor;
use crate::common::constants::*;
use crate::common::types::Venue;

/// Factory function to look up the extractor registered for a venue id
pub fn create_extractor(venue_id: i64) -> Option<Box<dyn VenueExtractor>> {
    match venue_id {
        EMPTY_BOTTLE_ID => Some(Box::new(EmptyBottleExtractor)),
        BOTTOM_LOUNGE_ID => Some(Box::new(BottomLoungeExtractor)),
        SUBTERRANEAN_ID => Some(Box::new(SubterraneanExtractor)),
        DOUBLE_DOOR_ID => Some(Box::new(DoubleDoorExtractor)),
        HOUSE_OF_BLUES_ID => Some(Box::new(HouseOfBluesExtractor)),
        THALIA_HALL_ID => Some(Box::new(ThaliaHallExtractor)),
        METRO_ID => Some(Box::new(MetroExtractor)),
        LINCOLN_HALL_ID => Some(Box::new(LhStExtractor::lincoln_hall())),
        SCHUBAS_ID => Some(Box::new(LhStExtractor::schubas())),
        _ => None,
    }
}

/// Reference rows for every venue, including the sentinel. Used to seed storage.
pub fn known_venues() -> Vec<Venue> {
    let venue = |id: i64, name: &str, address: &str, url: &str| Venue {
        id,
        name: name.to_string(),
        address: address.to_string(),
        schedule_url: url.to_string(),
        is_active: true,
    };

    vec![
        venue(
            EMPTY_BOTTLE_ID,
            EMPTY_BOTTLE_VENUE_NAME,
            "1035 N Western Ave., Chicago, IL 60622",
            EMPTY_BOTTLE_URL,
        ),
        venue(
            BOTTOM_LOUNGE_ID,
            BOTTOM_LOUNGE_VENUE_NAME,
            "1375 W Lake St., Chicago, IL 60607",
            BOTTOM_LOUNGE_URL,
        ),
        venue(
            SUBTERRANEAN_ID,
            SUBTERRANEAN_VENUE_NAME,
            "2011 W North Ave., Chicago, IL 60647",
            SUBTERRANEAN_URL,
        ),
        venue(
            DOUBLE_DOOR_ID,
            DOUBLE_DOOR_VENUE_NAME,
            "1551 N. Damen Ave., Chicago, IL 60622",
            DOUBLE_DOOR_URL,
        ),
        venue(
            HOUSE_OF_BLUES_ID,
            HOUSE_OF_BLUES_VENUE_NAME,
            "329 N Dearborn St., Chicago, IL 60654",
            HOUSE_OF_BLUES_URL,
        ),
        venue(
            THALIA_HALL_ID,
            THALIA_HALL_VENUE_NAME,
            "1807 S. Allport St., Chicago, IL 60608",
            THALIA_HALL_URL,
        ),
        venue(
            METRO_ID,
            METRO_VENUE_NAME,
            "3730 N. Clark St., Chicago, IL 60613",
            METRO_URL,
        ),
        venue(
            LINCOLN_HALL_ID,
            LINCOLN_HALL_VENUE_NAME,
            "2424 N Lincoln Ave., Chicago, IL 60614",
            LH_ST_URL,
        ),
        venue(
            SCHUBAS_ID,
            SCHUBAS_VENUE_NAME,
            "3159 N Southport Ave., Chicago, IL 60657",
            LH_ST_URL,
        ),
        venue(MISC_VENUE_ID, MISC_VENUE_NAME, "", ""),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_supported_id_has_an_extractor() {
        for id in get_supported_venue_ids() {
            let extractor = create_extractor(id).expect("registered extractor");
            assert_eq!(extractor.venue_id(), id);
        }
    }

    #[test]
    fn sentinel_and_unknown_ids_have_none() {
        assert!(create_extractor(MISC_VENUE_ID).is_none());
        assert!(create_extractor(42).is_none());
    }

    #[test]
    fn known_venues_cover_registry_and_sentinel() {
        let venues = known_venues();
        for id in get_supported_venue_ids() {
            let venue = venues.iter().find(|v| v.id == id).expect("venue row");
            let extractor = create_extractor(id).unwrap();
            assert_eq!(venue.name, extractor.venue_name());
        }
        assert!(venues.iter().any(|v| v.id == MISC_VENUE_ID));
    }
}
