fn main() -> anyhow::Result<()> {
    membership_dues_lib::run()
}
