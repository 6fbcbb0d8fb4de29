//! Dashboard View
//!
//! Sidebar navigation, the signed-in user's profile and a content area with
//! three sections. Switching sections replaces only the content area and
//! re-binds its listeners; it is not a router navigation.

use std::fmt;
use std::rc::Rc;
use tracing::{debug, error, info, warn};

use super::actions::ChatActions;
use crate::dom::{handler, Dom, EventKind};
use crate::markup::{el, Element, Markup};
use crate::models::{User, UserStatus};
use crate::router::{Params, Router, View, WeakRouter, LOGIN_VIEW};
use crate::services::{AuthService, ProfileUpdate, UserService};

pub const SECTION_TITLE_ID: &str = "section-title";
pub const CREATE_ROOM_ID: &str = "create-room-btn";
pub const LOGOUT_ID: &str = "logout-btn";
pub const SETTINGS_FORM_ID: &str = "settings-form";
pub const SETTINGS_USERNAME_ID: &str = "settings-username";
pub const SETTINGS_EMAIL_ID: &str = "settings-email";
pub const SETTINGS_BIO_ID: &str = "settings-bio";
pub const SETTINGS_STATUS_ID: &str = "settings-status";
pub const SAVE_SETTINGS_ID: &str = "save-settings-btn";

pub const MAIN_CONTENT_CLASS: &str = "main-content";
pub const NAV_ITEM_CLASS: &str = "nav-item";
pub const ROOM_ITEM_CLASS: &str = "room-item";
pub const FRIEND_ITEM_CLASS: &str = "friend-item";
const ACTIVE_CLASS: &str = "active";

/// Shown on the login view after the session was ended from here
pub const LOGGED_OUT_NOTICE: &str = "You have been logged out.";

struct SampleRoom {
    id: &'static str,
    name: &'static str,
    unread: Option<u32>,
}

const SAMPLE_ROOMS: &[SampleRoom] = &[
    SampleRoom { id: "room1", name: "general", unread: Some(3) },
    SampleRoom { id: "room2", name: "random", unread: None },
    SampleRoom { id: "room3", name: "announcements", unread: Some(1) },
];

struct SampleFriend {
    id: &'static str,
    name: &'static str,
    status: UserStatus,
}

const SAMPLE_FRIENDS: &[SampleFriend] = &[
    SampleFriend { id: "friend1", name: "Alice", status: UserStatus::Online },
    SampleFriend { id: "friend2", name: "Bob", status: UserStatus::Online },
    SampleFriend { id: "friend3", name: "Charlie", status: UserStatus::Offline },
];

/// Dashboard content sections
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Section {
    #[default]
    Rooms,
    Friends,
    Settings,
}

impl Section {
    pub const ALL: [Section; 3] = [Section::Rooms, Section::Friends, Section::Settings];

    pub fn as_str(&self) -> &'static str {
        match self {
            Section::Rooms => "rooms",
            Section::Friends => "friends",
            Section::Settings => "settings",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Section::Rooms => "Rooms",
            Section::Friends => "Friends",
            Section::Settings => "Settings",
        }
    }

    fn icon(&self) -> &'static str {
        match self {
            Section::Rooms => "#",
            Section::Friends => "@",
            Section::Settings => "⚙",
        }
    }

    /// Unknown or missing names fall back to rooms
    pub fn parse(value: Option<&str>) -> Self {
        match value {
            Some("friends") => Section::Friends,
            Some("settings") => Section::Settings,
            _ => Section::Rooms,
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn avatar_content(user: &User) -> Markup {
    if user.photo_url.is_empty() {
        Markup::Text(user.initial())
    } else {
        el("img")
            .attr("src", user.photo_url.as_str())
            .attr("alt", user.username.as_str())
            .class("avatar-img")
            .into()
    }
}

fn presence_class(status: UserStatus) -> String {
    format!("user-status status-{}", status.as_str())
}

fn render_profile(user: Option<&User>) -> Element {
    let logout = el("button")
        .id(LOGOUT_ID)
        .class("btn-ghost")
        .attr("title", "Logout")
        .text("🚪");

    let profile = el("div").class("user-profile");
    let profile = match user {
        Some(user) => profile
            .child(el("div").class("user-avatar").child(avatar_content(user)))
            .child(
                el("div")
                    .class("user-info")
                    .child(el("div").class("user-name").text(user.username.as_str()))
                    .child(
                        el("div")
                            .attr("class", presence_class(user.status))
                            .text(user.status.label()),
                    ),
            ),
        None => profile,
    };

    el("div").class("sidebar-footer").child(profile.child(logout))
}

fn render_rooms() -> Markup {
    el("div")
        .class("room-list")
        .children_from(SAMPLE_ROOMS.iter().map(|room| {
            let item = el("div")
                .class(ROOM_ITEM_CLASS)
                .attr("data-room-id", room.id)
                .child(el("span").class("room-name").text(format!("# {}", room.name)));
            match room.unread {
                Some(count) => item.child(el("span").class("room-unread").text(count.to_string())),
                None => item,
            }
        }))
        .into()
}

fn render_friend(friend: &SampleFriend) -> Element {
    let initial: String = friend.name.chars().take(1).collect();
    el("div")
        .class(FRIEND_ITEM_CLASS)
        .attr("data-friend-id", friend.id)
        .child(
            el("div")
                .class("friend-avatar")
                .class_if(friend.status == UserStatus::Offline, "friend-avatar-offline")
                .text(initial),
        )
        .child(
            el("div")
                .class("friend-info")
                .child(el("div").class("friend-name").text(friend.name))
                .child(
                    el("div")
                        .class("friend-status")
                        .class(&format!("status-{}", friend.status.as_str()))
                        .text(friend.status.label()),
                ),
        )
}

fn render_friends() -> Markup {
    let (online, offline): (Vec<&SampleFriend>, Vec<&SampleFriend>) = SAMPLE_FRIENDS
        .iter()
        .partition(|f| f.status != UserStatus::Offline);

    el("div")
        .class("friend-list")
        .child(
            el("div")
                .class("friend-group")
                .text(format!("ONLINE ({})", online.len())),
        )
        .children_from(online.into_iter().map(render_friend))
        .child(
            el("div")
                .class("friend-group")
                .text(format!("OFFLINE ({})", offline.len())),
        )
        .children_from(offline.into_iter().map(render_friend))
        .into()
}

fn render_settings(user: Option<&User>) -> Markup {
    let fallback = User::default();
    let user = user.unwrap_or(&fallback);

    let field = |id: &str, label: &str| {
        el("div").child(el("label").attr("for", id).class("form-label").text(label))
    };

    let status_select = el("select").id(SETTINGS_STATUS_ID).children_from(
        UserStatus::ALL.iter().map(|status| {
            let label = match status {
                UserStatus::Offline => "Invisible",
                other => other.label(),
            };
            el("option")
                .attr("value", status.as_str())
                .flag_if(*status == user.status, "selected")
                .text(label)
        }),
    );

    el("div")
        .class("card settings-card")
        .child(el("h3").text("Account Settings"))
        .child(
            el("form")
                .id(SETTINGS_FORM_ID)
                .class("settings-form")
                .child(
                    field(SETTINGS_USERNAME_ID, "Username")
                        .child(
                            el("input")
                                .attr("type", "text")
                                .id(SETTINGS_USERNAME_ID)
                                .attr("value", user.username.as_str())
                                .flag("disabled"),
                        )
                        .child(el("small").text("Username cannot be changed currently.")),
                )
                .child(
                    field(SETTINGS_EMAIL_ID, "Email").child(
                        el("input")
                            .attr("type", "email")
                            .id(SETTINGS_EMAIL_ID)
                            .attr("value", user.email.as_str())
                            .flag("disabled"),
                    ),
                )
                .child(
                    field(SETTINGS_BIO_ID, "Bio").child(
                        el("textarea")
                            .id(SETTINGS_BIO_ID)
                            .attr("rows", "3")
                            .attr("placeholder", "Tell us about yourself")
                            .text(user.bio.as_str()),
                    ),
                )
                .child(field(SETTINGS_STATUS_ID, "Status").child(status_select))
                .child(
                    el("div").class("settings-actions").child(
                        el("button")
                            .attr("type", "submit")
                            .class("btn-primary")
                            .id(SAVE_SETTINGS_ID)
                            .text("Save Changes"),
                    ),
                ),
        )
        .into()
}

/// Content area markup for a section
pub fn render_section_content(section: Section, user: Option<&User>) -> Markup {
    match section {
        Section::Rooms => render_rooms(),
        Section::Friends => render_friends(),
        Section::Settings => render_settings(user),
    }
}

/// Render the dashboard.
///
/// Params: `activeSection` ("rooms" by default) and `user`, the signed-in
/// profile. Without a user the profile block is left out.
pub fn render_dashboard_view(params: &Params) -> Markup {
    let active = Section::parse(params.get_str("activeSection"));
    let user = params.get::<User>("user");

    let nav = el("nav")
        .class("sidebar-nav")
        .children_from(Section::ALL.iter().map(|section| {
            el("div")
                .class(NAV_ITEM_CLASS)
                .class_if(*section == active, ACTIVE_CLASS)
                .attr("data-section", section.as_str())
                .child(el("span").class("nav-item-icon").text(section.icon()))
                .child(el("span").text(section.title()))
        }));

    let sidebar = el("aside")
        .class("dashboard-sidebar")
        .child(el("div").class("sidebar-header").child(el("h2").text("Chat App")))
        .child(nav)
        .child(render_profile(user.as_ref()));

    let header = el("header")
        .class("main-header")
        .child(el("h3").id(SECTION_TITLE_ID).text(active.title()))
        .child(
            el("button")
                .id(CREATE_ROOM_ID)
                .class("btn-primary")
                .attr_if(active != Section::Rooms, "style", "display: none;")
                .text("+ Create Room"),
        );

    let main = el("main")
        .class("dashboard-main")
        .child(header)
        .child(
            el("div")
                .class(MAIN_CONTENT_CLASS)
                .child(render_section_content(active, user.as_ref())),
        );

    el("div")
        .class("dashboard-container")
        .child(sidebar)
        .child(main)
        .into()
}

/// Swap the content area to `section` without re-rendering the view
pub fn update_dashboard_section<D: Dom>(dom: &D, section: Section, user: Option<&User>) {
    if let Some(content) = dom.by_class(MAIN_CONTENT_CLASS).first() {
        dom.set_inner_html(content, &render_section_content(section, user));
    }

    if let Some(title) = dom.by_id(SECTION_TITLE_ID) {
        dom.set_text(&title, section.title());
    }

    if let Some(button) = dom.by_id(CREATE_ROOM_ID) {
        let display = if section == Section::Rooms { "block" } else { "none" };
        dom.set_style(&button, "display", display);
    }

    for item in dom.by_class(NAV_ITEM_CLASS) {
        if dom.data(&item, "section").as_deref() == Some(section.as_str()) {
            dom.add_class(&item, ACTIVE_CLASS);
        } else {
            dom.remove_class(&item, ACTIVE_CLASS);
        }
    }
}

/// Refresh the sidebar profile from `user`
pub fn update_profile_panel<D: Dom>(dom: &D, user: &User) {
    if let Some(avatar) = dom.by_class("user-avatar").first() {
        dom.set_inner_html(avatar, &avatar_content(user));
    }
    if let Some(name) = dom.by_class("user-name").first() {
        dom.set_text(name, &user.username);
    }
    update_presence_text(dom, user.status);
}

pub fn update_presence_text<D: Dom>(dom: &D, status: UserStatus) {
    if let Some(node) = dom.by_class("user-status").first() {
        dom.set_text(node, status.label());
        dom.set_class_name(node, &presence_class(status));
    }
}

/// The dashboard view with navigation, logout, room, friend and settings
/// listeners
#[derive(Clone)]
pub struct DashboardView {
    auth: Rc<AuthService>,
    users: Rc<UserService>,
    actions: Rc<dyn ChatActions>,
    sign_out_on_logout: bool,
}

impl DashboardView {
    pub fn new(
        auth: Rc<AuthService>,
        users: Rc<UserService>,
        actions: Rc<dyn ChatActions>,
        sign_out_on_logout: bool,
    ) -> Self {
        Self {
            auth,
            users,
            actions,
            sign_out_on_logout,
        }
    }

    fn attach_navigation<D: Dom>(&self, router: &Router<D>) {
        let dom = router.dom();
        for item in dom.by_class(NAV_ITEM_CLASS) {
            let section = Section::parse(dom.data(&item, "section").as_deref());
            let view = self.clone();
            let weak = router.downgrade();
            dom.on(
                &item,
                EventKind::Click,
                handler(move || switch_section(view.clone(), weak.clone(), section)),
            );
        }
    }

    fn attach_logout<D: Dom>(&self, router: &Router<D>) {
        let dom = router.dom();
        if let Some(button) = dom.by_id(LOGOUT_ID) {
            let view = self.clone();
            let weak = router.downgrade();
            dom.on(
                &button,
                EventKind::Click,
                handler(move || logout(view.clone(), weak.clone())),
            );
        }
    }

    fn attach_create_room<D: Dom>(&self, router: &Router<D>) {
        let dom = router.dom();
        if let Some(button) = dom.by_id(CREATE_ROOM_ID) {
            let actions = Rc::clone(&self.actions);
            dom.on(
                &button,
                EventKind::Click,
                handler(move || {
                    if let Err(e) = actions.create_room() {
                        debug!("{}", e);
                    }
                    async {}
                }),
            );
        }
    }

    /// Bind listeners for the elements of the current content section
    fn attach_content<D: Dom>(&self, router: &Router<D>, section: Section) {
        let dom = router.dom();
        match section {
            Section::Rooms => {
                for item in dom.by_class(ROOM_ITEM_CLASS) {
                    let Some(room_id) = dom.data(&item, "room-id") else {
                        continue;
                    };
                    let actions = Rc::clone(&self.actions);
                    let weak = router.downgrade();
                    dom.on(
                        &item,
                        EventKind::Click,
                        handler(move || {
                            if let Some(router) = weak.upgrade() {
                                select_room(&**router.dom(), &room_id);
                            }
                            if let Err(e) = actions.open_room(&room_id) {
                                debug!("{}", e);
                            }
                            async {}
                        }),
                    );
                }
            }
            Section::Friends => {
                for item in dom.by_class(FRIEND_ITEM_CLASS) {
                    let Some(friend_id) = dom.data(&item, "friend-id") else {
                        continue;
                    };
                    let actions = Rc::clone(&self.actions);
                    dom.on(
                        &item,
                        EventKind::Click,
                        handler(move || {
                            if let Err(e) = actions.open_private_chat(&friend_id) {
                                debug!("{}", e);
                            }
                            async {}
                        }),
                    );
                }
            }
            Section::Settings => {
                if let Some(form) = dom.by_id(SETTINGS_FORM_ID) {
                    let view = self.clone();
                    let weak = router.downgrade();
                    dom.on(
                        &form,
                        EventKind::Submit,
                        handler(move || save_settings(view.clone(), weak.clone())),
                    );
                }
            }
        }
    }
}

impl<D: Dom> View<D> for DashboardView {
    fn render(&self, params: &Params) -> Markup {
        render_dashboard_view(params)
    }

    fn attach(&self, router: &Router<D>) {
        let section = Section::parse(router.current_params().get_str("activeSection"));
        self.attach_navigation(router);
        self.attach_logout(router);
        self.attach_create_room(router);
        self.attach_content(router, section);
    }
}

/// Mark the room with `room_id` active and clear the others
fn select_room<D: Dom>(dom: &D, room_id: &str) {
    for item in dom.by_class(ROOM_ITEM_CLASS) {
        if dom.data(&item, "room-id").as_deref() == Some(room_id) {
            dom.add_class(&item, ACTIVE_CLASS);
        } else {
            dom.remove_class(&item, ACTIVE_CLASS);
        }
    }
}

async fn switch_section<D: Dom>(view: DashboardView, router: WeakRouter<D>, section: Section) {
    let Some(router) = router.upgrade() else {
        return;
    };

    let mut user = router.current_params().get::<User>("user");
    let uid = user.as_ref().map(|u| u.uid.clone());
    if let (Section::Settings, Some(uid)) = (section, uid) {
        match view.users.get_user_by_id(&uid).await {
            Ok(Some(stored)) => user = Some(stored),
            Ok(None) => debug!(uid = %uid, "No stored profile; showing session user"),
            Err(e) => warn!(uid = %uid, "Could not load profile: {}", e),
        }
    }

    let dom = router.dom();
    update_dashboard_section(&**dom, section, user.as_ref());
    if let Some(user) = &user {
        update_profile_panel(&**dom, user);
    }

    if let Err(e) = view.actions.remember_section(section) {
        debug!("{}", e);
    }
    view.attach_content(&router, section);
}

async fn logout<D: Dom>(view: DashboardView, router: WeakRouter<D>) {
    let Some(router) = router.upgrade() else {
        return;
    };

    let mut params = Params::new();
    if view.sign_out_on_logout {
        if let Err(e) = view.auth.logout_user().await {
            error!("Logout failed: {}", e);
            router.dom().alert(&e.user_message());
            return;
        }
        params.insert("notice", LOGGED_OUT_NOTICE);
    } else {
        debug!("Leaving dashboard without ending the session");
    }

    let _ = router.navigate_to(LOGIN_VIEW, params);
}

async fn save_settings<D: Dom>(view: DashboardView, router: WeakRouter<D>) {
    let Some(router) = router.upgrade() else {
        return;
    };
    let dom = Rc::clone(router.dom());

    let uid = view
        .auth
        .current_user()
        .map(|u| u.uid)
        .or_else(|| router.current_params().get::<User>("user").map(|u| u.uid));
    let Some(uid) = uid else {
        dom.alert("Please log in again to update your settings.");
        return;
    };

    let save_btn = dom.by_id(SAVE_SETTINGS_ID);
    if save_btn.as_ref().is_some_and(|btn| dom.is_disabled(btn)) {
        return;
    }

    let bio = dom
        .by_id(SETTINGS_BIO_ID)
        .map(|n| dom.value(&n))
        .unwrap_or_default();
    let status = dom
        .by_id(SETTINGS_STATUS_ID)
        .and_then(|n| dom.value(&n).parse::<UserStatus>().ok())
        .unwrap_or_default();

    if let Some(btn) = &save_btn {
        dom.set_disabled(btn, true);
    }

    let update = ProfileUpdate {
        bio: Some(bio),
        status: Some(status),
        ..Default::default()
    };
    let result = view.users.update_user_profile(&uid, update).await;

    if let Some(btn) = &save_btn {
        dom.set_disabled(btn, false);
    }

    match result {
        Ok(()) => {
            info!(uid = %uid, "Settings saved");
            update_presence_text(&*dom, status);
        }
        Err(e) => {
            error!(uid = %uid, "Saving settings failed: {}", e);
            dom.alert("Failed to save settings. Please try again.");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::MemoryDom;

    fn alice() -> User {
        User {
            uid: "u1".into(),
            username: "alice".into(),
            email: "alice@x.io".into(),
            bio: "hello <there>".into(),
            status: UserStatus::Away,
            ..Default::default()
        }
    }

    fn mounted(params: &Params) -> MemoryDom {
        let dom = MemoryDom::new();
        let root = dom.by_id("root").unwrap();
        dom.set_inner_html(&root, &render_dashboard_view(params));
        dom
    }

    fn active_sections(dom: &MemoryDom) -> Vec<String> {
        dom.by_class(NAV_ITEM_CLASS)
            .iter()
            .filter(|n| dom.has_class(n, ACTIVE_CLASS))
            .filter_map(|n| dom.data(n, "section"))
            .collect()
    }

    #[test]
    fn test_section_parse() {
        assert_eq!(Section::parse(None), Section::Rooms);
        assert_eq!(Section::parse(Some("friends")), Section::Friends);
        assert_eq!(Section::parse(Some("nope")), Section::Rooms);
    }

    #[test]
    fn test_render_with_user() {
        let dom = mounted(&Params::new().with("user", alice()));
        let name = dom.by_class("user-name");
        assert_eq!(dom.text(&name[0]), "alice");
        let avatar = dom.by_class("user-avatar");
        assert_eq!(dom.text(&avatar[0]), "A");
        let status = dom.by_class("user-status");
        assert_eq!(dom.text(&status[0]), "Away");
        assert!(dom.by_id(LOGOUT_ID).is_some());
        assert_eq!(active_sections(&dom), vec!["rooms"]);
        assert_eq!(dom.by_class(ROOM_ITEM_CLASS).len(), 3);
    }

    #[test]
    fn test_render_without_user_omits_profile() {
        let html = render_dashboard_view(&Params::new()).to_string();
        assert!(!html.contains("user-name"));
        assert!(!html.contains("User"));
        assert!(html.contains(LOGOUT_ID));
    }

    #[test]
    fn test_photo_avatar() {
        let mut user = alice();
        user.photo_url = "https://img/a.png".into();
        let html = render_dashboard_view(&Params::new().with("user", user)).to_string();
        assert!(html.contains(r#"<img src="https://img/a.png" alt="alice""#));
    }

    #[test]
    fn test_render_settings_section() {
        let params = Params::new()
            .with("user", alice())
            .with("activeSection", "settings");
        let dom = mounted(&params);

        assert_eq!(active_sections(&dom), vec!["settings"]);
        let create = dom.by_id(CREATE_ROOM_ID).unwrap();
        assert_eq!(dom.style(&create, "display").as_deref(), Some("none"));

        let bio = dom.by_id(SETTINGS_BIO_ID).unwrap();
        assert_eq!(dom.value(&bio), "hello <there>");
        let status = dom.by_id(SETTINGS_STATUS_ID).unwrap();
        assert_eq!(dom.value(&status), "away");
        let email = dom.by_id(SETTINGS_EMAIL_ID).unwrap();
        assert!(dom.is_disabled(&email));
    }

    #[test]
    fn test_update_section_in_place() {
        let dom = mounted(&Params::new());
        let root_before = dom.by_class("dashboard-sidebar")[0].clone();

        update_dashboard_section(&dom, Section::Friends, None);
        assert_eq!(dom.text(&dom.by_id(SECTION_TITLE_ID).unwrap()), "Friends");
        assert_eq!(dom.by_class(FRIEND_ITEM_CLASS).len(), 3);
        assert!(dom.by_class(ROOM_ITEM_CLASS).is_empty());
        assert_eq!(active_sections(&dom), vec!["friends"]);
        let create = dom.by_id(CREATE_ROOM_ID).unwrap();
        assert_eq!(dom.style(&create, "display").as_deref(), Some("none"));

        update_dashboard_section(&dom, Section::Rooms, None);
        assert_eq!(dom.style(&create, "display").as_deref(), Some("block"));
        // the sidebar was not re-rendered
        assert!(dom.by_class("dashboard-sidebar")[0].ptr_eq(&root_before));
    }

    #[test]
    fn test_presence_text() {
        let dom = mounted(&Params::new().with("user", alice()));
        update_presence_text(&dom, UserStatus::Dnd);
        let status = &dom.by_class("user-status")[0];
        assert_eq!(dom.text(status), "Do Not Disturb");
        assert!(dom.has_class(status, "status-dnd"));
        assert!(!dom.has_class(status, "status-away"));
    }

    #[test]
    fn test_profile_panel() {
        let dom = mounted(&Params::new().with("user", alice()));
        let mut user = alice();
        user.username = "zoe".into();
        user.status = UserStatus::Online;
        update_profile_panel(&dom, &user);
        assert_eq!(dom.text(&dom.by_class("user-name")[0]), "zoe");
        assert_eq!(dom.text(&dom.by_class("user-avatar")[0]), "Z");
        assert_eq!(dom.text(&dom.by_class("user-status")[0]), "Online");
    }

    #[test]
    fn test_select_room() {
        let dom = mounted(&Params::new());
        select_room(&dom, "room2");
        select_room(&dom, "room3");
        let active: Vec<String> = dom
            .by_class(ROOM_ITEM_CLASS)
            .iter()
            .filter(|n| dom.has_class(n, ACTIVE_CLASS))
            .filter_map(|n| dom.data(n, "room-id"))
            .collect();
        assert_eq!(active, vec!["room3"]);
    }
}
