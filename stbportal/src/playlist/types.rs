use serde::Serialize;

/**
    One channel as listed to the box.

    Only `id`, `name`, `logo` and `cmd` come from the playlist; the remaining
    fields are fixed values the portal protocol requires on every item.
*/
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChannelRecord {
    pub id: String,
    pub name: String,
    pub number: u32,
    pub cmd: String,
    pub logo: String,
    pub use_http_tmp_link: u8,
    pub tv_genre_id: String,
    pub lock: u8,
    pub fav: u8,
    pub open: u8,
    pub volume_correction: i32,
}

impl ChannelRecord {
    pub fn new(number: u32, name: String, logo: String, cmd: String) -> Self {
        Self {
            id: number.to_string(),
            name,
            number,
            cmd,
            logo,
            use_http_tmp_link: 1,
            tv_genre_id: "1".to_string(),
            lock: 0,
            fav: 0,
            open: 1,
            volume_correction: 0,
        }
    }
}
