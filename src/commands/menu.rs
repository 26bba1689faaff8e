//! Fixed keyword menus answered in group chats.

use crate::reply::MenuAction;

const fn msg(label: &'static str, text: &'static str) -> MenuAction {
    MenuAction::Message { label, text }
}

const fn uri(label: &'static str, uri: &'static str) -> MenuAction {
    MenuAction::Uri { label, uri }
}

pub const COMMANDS: &[MenuAction] = &[
    msg("交車", "交車？"),
    msg("外觀", "外觀相關？"),
    msg("內裝", "內裝相關？"),
    msg("設定", "設定相關？"),
    msg("行車記錄器", "行車記錄器？"),
    msg("輪胎", "輪胎相關？"),
    msg("防跳石網", "防跳石網？"),
    msg("鑰匙皮套", "鑰匙皮套？"),
    msg("遮陽簾", "遮陽簾？"),
    msg("隔熱紙", "隔熱紙？"),
    uri(
        "更多 (尚未更新)",
        "https://drive.google.com/file/d/1AM7PAPzMhp9BT3qKEP0lMdDKEx62kRSW/view",
    ),
];

const DELIVERY: &[MenuAction] = &[
    uri(
        "交車前驗車檢查項目2.0",
        "https://drive.google.com/file/d/19N6rUajn42eWfQJMikYySdcyGEvr1QR4/view",
    ),
    uri(
        "正式交車檢查2.0",
        "https://drive.google.com/file/d/1S-XPfwNZFWAwQzc3gZbOj3vM8dP7TXR4/view",
    ),
];

const CLUB_STICKERS: &[MenuAction] = &[uri(
    "KAMIQ TW CLUB 族貼 | 族框",
    "https://kamiq.club/article?sid=350&aid=434",
)];

const EXTERIOR: &[MenuAction] = &[
    uri("水簾洞與導水條", "https://kamiq.club/article?sid=324&aid=378"),
    uri("雨刷異音、會跳、立雨刷與更換", "https://kamiq.club/article?sid=324&aid=379"),
    uri("後視鏡指甲倒插問題", "https://kamiq.club/article?sid=324&aid=381"),
    uri("第三煞車燈水氣無法散去", "https://kamiq.club/article?sid=324&aid=382"),
    uri("更多", "https://kamiq.club/article?sid=324"),
];

const INTERIOR: &[MenuAction] = &[
    uri("車室異音-低速篇", "https://kamiq.club/article?sid=325&aid=383"),
    uri("車室異音-高速篇", "https://kamiq.club/article?sid=325&aid=384"),
    uri("車室靜音工程(含DIY與外廠安裝)", "https://kamiq.club/article?sid=325&aid=386"),
    uri("冷氣濾網更換", "https://kamiq.club/article?sid=325&aid=400"),
    uri("更多", "https://kamiq.club/article?sid=325"),
];

const SETTINGS: &[MenuAction] = &[
    uri("搖控器啟閉車窗示範", "https://kamiq.club/article?sid=328&aid=375"),
    uri("Keyless鑰匙沒電手動開門方式", "https://kamiq.club/article?sid=328&aid=376"),
    uri("怠速引擎熄火判斷條件", "https://kamiq.club/article?sid=328&aid=377"),
    uri("更多", "https://kamiq.club/article?sid=328"),
];

const DASHCAMS: &[MenuAction] = &[
    uri("Garmin 66WD", "https://kamiq.club/article?sid=329&aid=394"),
    uri("HP S970 (電子後視鏡)", "https://kamiq.club/article?sid=329&aid=395"),
    uri("DOD RX900", "https://kamiq.club/article?sid=329&aid=503"),
    uri("更多", "https://kamiq.club/article?sid=328"),
];

const TIRES: &[MenuAction] = &[
    uri("胎壓偵測器", "https://kamiq.club/article?sid=334&aid=388"),
    uri("有線/無線打氣機", "https://kamiq.club/article?sid=334&aid=456"),
    uri("更多", "https://kamiq.club/article?sid=334"),
];

const GRILLE_NETS: &[MenuAction] = &[
    uri("防跳石網安裝", "https://kamiq.club/article?sid=335&aid=402"),
    uri("防跳石網配色參考", "https://kamiq.club/article?sid=335&aid=404"),
    uri("怠速引擎熄火判斷條件", "https://kamiq.club/article?sid=328&aid=377"),
    uri("更多", "https://kamiq.club/article?sid=335"),
];

const KEY_COVERS: &[MenuAction] = &[
    uri("Hsu's 頑皮革", "https://kamiq.club/article?sid=338&aid=416"),
    uri("Story Leather", "https://kamiq.club/article?sid=338&aid=425"),
    uri("賽頓精品手工皮件", "https://kamiq.club/article?sid=338&aid=423"),
    uri("JC手作客製皮套", "https://kamiq.club/article?sid=338&aid=424"),
    uri("更多", "https://kamiq.club/article?sid=338"),
];

const SUNSHADES: &[MenuAction] = &[
    uri("晴天遮陽簾", "https://kamiq.club/article?sid=330&aid=438"),
    uri("徐府遮陽簾", "https://kamiq.club/article?sid=330&aid=439"),
    uri("更多", "https://kamiq.club/article?sid=330"),
];

const WINDOW_FILM: &[MenuAction] = &[
    uri("GAMA-E系列", "https://kamiq.club/article?sid=330&aid=403"),
    uri("Carlife X系列", "https://kamiq.club/article?sid=330&aid=417"),
    uri("3M極黑系列", "https://kamiq.club/article?sid=330&aid=499"),
    uri("Solar Gard 舒熱佳鑽石 LX 系列", "https://kamiq.club/article?sid=330&aid=500"),
    uri("更多", "https://kamiq.club/article?sid=330"),
];

const DASH_MATS: &[MenuAction] = &[
    uri("愛力美奈納碳避光墊", "https://kamiq.club/article?sid=333&aid=427"),
    uri("BSM專用仿麂皮避光墊", "https://kamiq.club/article?sid=333&aid=428"),
];

const RAIN_GUARDS: &[MenuAction] = &[uri("晴雨窗", "https://kamiq.club/article?sid=333&aid=445")];

const FLOOR_MATS: &[MenuAction] = &[
    uri("3D卡固", "https://kamiq.club/article?sid=331&aid=406"),
    uri("Škoda原廠腳踏墊", "https://kamiq.club/article?sid=331&aid=420"),
    uri("台中裕峰訂製款", "https://kamiq.club/article?sid=331&aid=419"),
];

const TRUNK_MATS: &[MenuAction] = &[
    uri("後車廂墊", "https://kamiq.club/article?sid=331&aid=430"),
    uri("3M安美", "https://kamiq.club/article?sid=331&aid=418"),
];

const TRIM_PANELS: &[MenuAction] = &[uri(
    "車側飾板|後廂護板",
    "https://kamiq.club/article?sid=336",
)];

const ACCESSORIES: &[MenuAction] = &[
    uri("旋轉杯架", "https://kamiq.club/article?sid=350&aid=436"),
    uri("後行李箱連動燈", "https://kamiq.club/article?sid=350&aid=448"),
    uri("光控燈膜", "https://kamiq.club/article?sid=350&aid=446"),
    uri("KAMIQ TW CLUB 族貼 | 族框", "https://kamiq.club/article?sid=350&aid=434"),
    uri("更多", "https://kamiq.club/article?sid=350"),
];

const GENUINE_PARTS: &[MenuAction] = &[
    uri("原廠週邊價格表", "https://kamiq.club/article?sid=349&aid=407"),
    uri("原廠檔泥板", "https://kamiq.club/article?sid=349&aid=444"),
    uri("原廠門側垃圾桶", "https://kamiq.club/article?sid=349&aid=442"),
    uri("原廠多媒體底座", "https://kamiq.club/article?sid=349&aid=443"),
    uri("更多", "https://kamiq.club/article?sid=349"),
];

/// Actions for a stripped keyword. Synonyms share one table.
pub fn lookup(key: &str) -> Option<&'static [MenuAction]> {
    let actions = match key {
        "指令" | "常用指令" => COMMANDS,
        "交車" => DELIVERY,
        "族貼" | "族框" => CLUB_STICKERS,
        "外觀相關" => EXTERIOR,
        "內裝相關" => INTERIOR,
        "設定相關" => SETTINGS,
        "行車記錄器" => DASHCAMS,
        "輪胎相關" => TIRES,
        "防跳石網" => GRILLE_NETS,
        "鑰匙皮套" => KEY_COVERS,
        "遮陽簾" => SUNSHADES,
        "隔熱紙" => WINDOW_FILM,
        "避光墊" => DASH_MATS,
        "晴雨窗" => RAIN_GUARDS,
        "腳踏墊" => FLOOR_MATS,
        "後車廂墊" => TRUNK_MATS,
        "車側飾板" | "後廂護板" => TRIM_PANELS,
        "其他週邊" => ACCESSORIES,
        "原廠週邊" => GENUINE_PARTS,
        _ => return None,
    };
    Some(actions)
}
