use swerve_kinematics::*;

fn main() {
    let half_length = 0.3;
    let half_width = 0.3;
    let drive = SwerveDrive::new(
        ModuleGeometry::new(half_length, half_width),
        ModuleGeometry::new(half_length, -half_width),
        ModuleGeometry::new(-half_length, half_width),
        ModuleGeometry::new(-half_length, -half_width),
    );

    let commands = [
        ChassisSpeeds::new(1.0, 0.0, 0.0),  // straight ahead
        ChassisSpeeds::new(0.0, 1.0, 0.0),  // strafe left
        ChassisSpeeds::new(0.0, 0.0, 1.0),  // spin in place
        ChassisSpeeds::new(1.0, 0.0, 1.0),  // drive while turning
        ChassisSpeeds::new(-0.5, 0.5, -0.5),
    ];

    println!("Kinematics: {}", drive);
    for speeds in commands {
        println!("\nCommand: {}", speeds);
        let states = drive.transform_speeds(speeds);
        for (module, state) in Module::ALL.iter().zip(states.iter()) {
            println!("  {}: {}", module, state);
        }
    }
}
