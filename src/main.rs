fn main() {
    translation_popup_lib::run()
}
