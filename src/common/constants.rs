/// Venue registry constants to keep ids, display names and schedule URLs consistent
/// across extractors, the registry and the stored venue rows.

// Stable venue ids (primary keys of the venues table)
pub const EMPTY_BOTTLE_ID: i64 = 1;
pub const BOTTOM_LOUNGE_ID: i64 = 2;
pub const SUBTERRANEAN_ID: i64 = 3;
pub const DOUBLE_DOOR_ID: i64 = 4;
pub const HOUSE_OF_BLUES_ID: i64 = 5;
pub const THALIA_HALL_ID: i64 = 6;
pub const METRO_ID: i64 = 7;
pub const LINCOLN_HALL_ID: i64 = 8;
pub const SCHUBAS_ID: i64 = 9;

/// Shows a venue promotes at some other location are filed under this venue.
pub const MISC_VENUE_ID: i64 = 99;

// Venue names (consistent across the application)
pub const EMPTY_BOTTLE_VENUE_NAME: &str = "The Empty Bottle";
pub const BOTTOM_LOUNGE_VENUE_NAME: &str = "Bottom Lounge";
pub const SUBTERRANEAN_VENUE_NAME: &str = "Subterranean";
pub const DOUBLE_DOOR_VENUE_NAME: &str = "Double Door";
pub const HOUSE_OF_BLUES_VENUE_NAME: &str = "House of Blues";
pub const THALIA_HALL_VENUE_NAME: &str = "Thalia Hall";
pub const METRO_VENUE_NAME: &str = "Metro";
pub const LINCOLN_HALL_VENUE_NAME: &str = "Lincoln Hall";
pub const SCHUBAS_VENUE_NAME: &str = "Schubas Tavern";
pub const MISC_VENUE_NAME: &str = "Miscellaneous / Other";

// Schedule pages
pub const EMPTY_BOTTLE_URL: &str = "http://emptybottle.com";
pub const BOTTOM_LOUNGE_URL: &str = "http://bottomlounge.com/events";
pub const SUBTERRANEAN_URL: &str = "http://www.subt.net";
pub const DOUBLE_DOOR_URL: &str = "http://doubledoor.com";
pub const HOUSE_OF_BLUES_URL: &str = "http://houseofblues.com/chicago";
pub const THALIA_HALL_URL: &str = "http://thaliahallchicago.com/";
pub const METRO_URL: &str = "http://metrochicago.com/shows/";
pub const LH_ST_URL: &str = "http://www.lh-st.com";

// Price strings for venues that do not publish prices on their own pages
pub const SEE_TICKET_SITE_PRICE: &str = "(See ticketing site for price)";
pub const CHECK_TICKET_SITE_PRICE: &str = "Check ticket site for price.";
pub const NO_PRICE_LISTED: &str = "No price / free?";

/// All listed venues sit in Chicago.
pub const SOURCE_TIME_ZONE: chrono_tz::Tz = chrono_tz::America::Chicago;

/// Get all venue ids that have a scraper
pub fn get_supported_venue_ids() -> Vec<i64> {
    vec![
        EMPTY_BOTTLE_ID,
        BOTTOM_LOUNGE_ID,
        SUBTERRANEAN_ID,
        DOUBLE_DOOR_ID,
        HOUSE_OF_BLUES_ID,
        THALIA_HALL_ID,
        METRO_ID,
        LINCOLN_HALL_ID,
        SCHUBAS_ID,
    ]
}
