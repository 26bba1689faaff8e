//! Fixed texts the registration flow sends back to the user.

use super::state::{InputError, RegistrationStep};

/// The exact phrase that starts a registration.
pub const TRIGGER_PHRASE: &str = "一起抓抓樂";

pub const AUTHORIZATION_FAILED: &str = "授權未通過，請確認已在 KamiQ 車主限定群";

pub const ASK_PLATE: &str = "授權通過，請輸入車牌號碼含-，例如: ABC-1234";

pub const ASK_PLACES: &str = "設定完成，請輸入日常工作生活區域，例如: 龜山島";

pub const ASK_INTRO: &str = "設定完成\n請輸入自我介紹 (限 50 字)\n若無自介請輸入 52~~\n自介將會顯示我愛蛇哥";

pub const ASK_COVER: &str = "設定完成，請上傳最得意的愛車照片\n建議橫式照片，較不易被裁切";

pub const REGISTRATION_COMPLETE: &str = "抓抓樂資料已更新完成";

pub const REGISTRATION_FAILED: &str = "抓抓樂資料更新失敗，請重新上傳照片";

/// Prompt sent after moving into `step`.
pub fn prompt_for(step: RegistrationStep) -> &'static str {
    match step {
        RegistrationStep::AwaitingPlate => ASK_PLATE,
        RegistrationStep::AwaitingPlaces => ASK_PLACES,
        RegistrationStep::AwaitingIntro => ASK_INTRO,
        RegistrationStep::AwaitingCover => ASK_COVER,
    }
}

/// Corrective message for a rejected answer.
pub fn correction_for(error: &InputError) -> &'static str {
    match error {
        InputError::InvalidPlate => "錯誤的車牌號碼格式，請重新輸入",
        InputError::IntroTooLong { .. } => "已超出字數上限 (50)，請重新輸入",
    }
}
